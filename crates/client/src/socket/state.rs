//! Reconnection state machine.
//!
//! Every state change of the socket goes through [`ReconnectMachine::handle`],
//! which is pure: it consumes a [`SocketEvent`] and returns the [`Directive`]
//! the runtime must carry out. Timers, transports and callbacks live in
//! [`super::client`].

use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

/// Fixed-delay, bounded reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Reconnection attempts allowed after a loss. The initial connection
    /// attempt is not counted.
    pub max_attempts: u32,
    /// Delay before every reconnection attempt. No backoff, no jitter.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that never reconnects.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            max_attempts: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// A connection attempt is in progress.
    #[default]
    Connecting,
    /// The connection is live; sends are forwarded.
    Open,
    /// The connection was lost and a retry is scheduled.
    ClosedWillRetry,
    /// Terminal: retries are exhausted or the socket was closed explicitly.
    ClosedGivingUp,
}

impl ConnectionState {
    /// Whether no further connection attempt will ever be made.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ClosedGivingUp)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::ClosedWillRetry => "closed (will retry)",
            Self::ClosedGivingUp => "closed",
        })
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketEvent {
    /// The transport finished its handshake.
    Opened,
    /// The connection closed or failed. An error and the close that follows
    /// it are reported as a single loss.
    Lost,
    /// The retry delay elapsed.
    RetryElapsed,
    /// The owner asked for the socket to be closed.
    CloseRequested,
}

/// What the runtime must do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Nothing; the event was not applicable in the current state.
    Ignore,
    /// Invoke the open callback.
    NotifyOpen,
    /// Invoke the close callback, then wait `delay` and feed
    /// [`SocketEvent::RetryElapsed`].
    ScheduleRetry {
        /// Delay before the next attempt.
        delay: Duration,
    },
    /// Start a new connection attempt.
    Connect,
    /// Invoke the close callback and stop for good.
    GiveUp,
    /// Stop for good without any further callback.
    Shutdown,
}

/// The reconnection state machine.
#[derive(Debug, Clone)]
pub struct ReconnectMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
}

impl ReconnectMachine {
    /// Create a machine in [`ConnectionState::Connecting`].
    #[must_use]
    pub const fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Connecting,
            attempts: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnection attempts made since the last successful open.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Apply `event` and return the directive for the runtime.
    pub const fn handle(&mut self, event: SocketEvent) -> Directive {
        use ConnectionState::{ClosedGivingUp, ClosedWillRetry, Connecting, Open};

        match (self.state, event) {
            (ClosedGivingUp, _) => Directive::Ignore,
            (_, SocketEvent::CloseRequested) => {
                self.state = ClosedGivingUp;
                Directive::Shutdown
            }
            (Connecting, SocketEvent::Opened) => {
                self.state = Open;
                self.attempts = 0;
                Directive::NotifyOpen
            }
            (Connecting | Open, SocketEvent::Lost) => {
                if self.attempts < self.policy.max_attempts {
                    self.state = ClosedWillRetry;
                    Directive::ScheduleRetry {
                        delay: self.policy.delay,
                    }
                } else {
                    self.state = ClosedGivingUp;
                    Directive::GiveUp
                }
            }
            (ClosedWillRetry, SocketEvent::RetryElapsed) => {
                self.state = Connecting;
                self.attempts += 1;
                Directive::Connect
            }
            _ => Directive::Ignore,
        }
    }
}
