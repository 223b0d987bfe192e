//! The reconnecting socket runtime.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::state::{ConnectionState, Directive, ReconnectMachine, ReconnectPolicy, SocketEvent};
use super::transport::{CloseInfo, Connection, Connector, Inbound, SocketError, TungsteniteConnector};

type MessageHandler = Box<dyn FnMut(String) + Send>;
type OpenHandler = Box<dyn FnMut() + Send>;
type CloseHandler = Box<dyn FnMut(Option<&CloseInfo>) + Send>;
type ErrorHandler = Box<dyn FnMut(&SocketError) + Send>;

/// Optional callbacks invoked by [`ReconnectingSocket`].
///
/// Each event invokes at most the matching callback. Callbacks run on the
/// socket's task and should not block.
#[derive(Default)]
pub struct SocketHandlers {
    on_message: Option<MessageHandler>,
    on_open: Option<OpenHandler>,
    on_close: Option<CloseHandler>,
    on_error: Option<ErrorHandler>,
}

impl SocketHandlers {
    /// Handlers that ignore every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the raw text of every inbound message.
    #[must_use]
    pub fn on_message(mut self, handler: impl FnMut(String) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(handler));
        self
    }

    /// Called when a connection opens.
    #[must_use]
    pub fn on_open(mut self, handler: impl FnMut() + Send + 'static) -> Self {
        self.on_open = Some(Box::new(handler));
        self
    }

    /// Called when a connection is lost or could not be established.
    #[must_use]
    pub fn on_close(mut self, handler: impl FnMut(Option<&CloseInfo>) + Send + 'static) -> Self {
        self.on_close = Some(Box::new(handler));
        self
    }

    /// Called when the transport reports an error. A close callback follows.
    #[must_use]
    pub fn on_error(mut self, handler: impl FnMut(&SocketError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    fn message(&mut self, text: String) {
        if let Some(handler) = self.on_message.as_mut() {
            handler(text);
        }
    }

    fn open(&mut self) {
        if let Some(handler) = self.on_open.as_mut() {
            handler();
        }
    }

    fn close(&mut self, info: Option<&CloseInfo>) {
        if let Some(handler) = self.on_close.as_mut() {
            handler(info);
        }
    }

    fn error(&mut self, error: &SocketError) {
        if let Some(handler) = self.on_error.as_mut() {
            handler(error);
        }
    }
}

impl std::fmt::Debug for SocketHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketHandlers")
            .field("on_message", &self.on_message.is_some())
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// A duplex JSON message channel that re-establishes itself after loss.
///
/// The first connection attempt starts as soon as the socket is constructed.
/// After a loss the socket waits the policy's fixed delay and tries again,
/// up to `max_attempts` times in a row; a successful open resets the count.
/// Dropping the socket closes it.
#[derive(Debug)]
pub struct ReconnectingSocket {
    outbound: mpsc::UnboundedSender<String>,
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
}

impl ReconnectingSocket {
    /// Connect to `url` over WebSocket.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn connect(url: impl Into<String>, policy: ReconnectPolicy, handlers: SocketHandlers) -> Self {
        Self::connect_with(Arc::new(TungsteniteConnector), url, policy, handlers)
    }

    /// Connect to `url` through a custom transport.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn connect_with(
        connector: Arc<dyn Connector>,
        url: impl Into<String>,
        policy: ReconnectPolicy,
        handlers: SocketHandlers,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runtime = Runtime {
            url: url.into(),
            connector,
            handlers,
            machine: ReconnectMachine::new(policy),
            state: state_tx,
            shutdown: shutdown_rx,
            outbound: outbound_rx,
        };
        tokio::spawn(runtime.run());

        Self {
            outbound: outbound_tx,
            state: state_rx,
            shutdown: shutdown_tx,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Serialise `payload` as JSON and send it if the socket is open.
    ///
    /// When the socket is not open the payload is dropped without error.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Encode`] if the payload cannot be serialised.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), SocketError> {
        if *self.shutdown.borrow() || self.state() != ConnectionState::Open {
            debug!(state = %self.state(), "Socket not open, dropping outbound message");
            return Ok(());
        }

        let text = serde_json::to_string(payload)?;
        if self.outbound.send(text).is_err() {
            debug!("Socket task has stopped, dropping outbound message");
        }
        Ok(())
    }

    /// Close the socket for good. No callback fires afterwards and any
    /// scheduled reconnection is cancelled.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    /// Wait until the socket has given up or been closed.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(ConnectionState::is_terminal).await;
    }
}

impl Drop for ReconnectingSocket {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolves once the owner asks for shutdown or goes away.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|closed| *closed).await;
}

enum Ended {
    Lost(Option<CloseInfo>),
    Shutdown,
}

struct Runtime {
    url: String,
    connector: Arc<dyn Connector>,
    handlers: SocketHandlers,
    machine: ReconnectMachine,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Receiver<bool>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl Runtime {
    async fn run(mut self) {
        loop {
            let connected = tokio::select! {
                biased;
                () = shutdown_requested(&mut self.shutdown) => {
                    self.apply(SocketEvent::CloseRequested);
                    return;
                }
                result = self.connector.connect(&self.url) => result,
            };

            let directive = match connected {
                Ok(mut connection) => {
                    if self.apply(SocketEvent::Opened) == Directive::NotifyOpen {
                        info!(url = %self.url, "Socket connected");
                        self.handlers.open();
                    }
                    match self.pump(connection.as_mut()).await {
                        Ended::Shutdown => {
                            connection.close().await;
                            self.apply(SocketEvent::CloseRequested);
                            return;
                        }
                        Ended::Lost(info) => {
                            self.discard_outbound();
                            self.lose(info.as_ref())
                        }
                    }
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "Socket connection failed");
                    self.handlers.error(&e);
                    self.lose(None)
                }
            };

            let Directive::ScheduleRetry { delay } = directive else {
                warn!(url = %self.url, "Socket reconnection attempts exhausted, giving up");
                return;
            };

            tokio::select! {
                biased;
                () = shutdown_requested(&mut self.shutdown) => {
                    self.apply(SocketEvent::CloseRequested);
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }

            if self.apply(SocketEvent::RetryElapsed) != Directive::Connect {
                return;
            }
            debug!(attempt = self.machine.attempts(), "Reconnecting socket");
        }
    }

    /// Deliver inbound frames and forward outbound ones until the connection
    /// ends or the owner closes the socket.
    async fn pump(&mut self, connection: &mut dyn Connection) -> Ended {
        loop {
            tokio::select! {
                biased;
                () = shutdown_requested(&mut self.shutdown) => return Ended::Shutdown,
                inbound = connection.recv() => match inbound {
                    Some(Ok(Inbound::Text(text))) => self.handlers.message(text),
                    Some(Ok(Inbound::Closed(info))) => return Ended::Lost(info),
                    Some(Err(e)) => {
                        warn!(url = %self.url, error = %e, "Socket transport error");
                        self.handlers.error(&e);
                        return Ended::Lost(None);
                    }
                    None => return Ended::Lost(None),
                },
                Some(text) = self.outbound.recv() => {
                    if let Err(e) = connection.send_text(text).await {
                        warn!(url = %self.url, error = %e, "Socket send failed");
                        self.handlers.error(&e);
                        return Ended::Lost(None);
                    }
                }
            }
        }
    }

    /// Record a loss and fire the close callback unless the socket was
    /// closed in the meantime.
    fn lose(&mut self, info: Option<&CloseInfo>) -> Directive {
        let directive = self.apply(SocketEvent::Lost);
        if matches!(directive, Directive::ScheduleRetry { .. } | Directive::GiveUp) {
            warn!(url = %self.url, code = info.map(|i| i.code), "Socket closed");
            self.handlers.close(info);
        }
        directive
    }

    fn discard_outbound(&mut self) {
        let mut dropped = 0_usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Discarded messages queued on a lost connection");
        }
    }

    fn apply(&mut self, event: SocketEvent) -> Directive {
        let directive = self.machine.handle(event);
        self.state.send_replace(self.machine.state());
        directive
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::time::Instant;
    use tokio_tungstenite::tungstenite::Error as WsError;

    use super::*;

    type Feed = mpsc::UnboundedSender<Option<Result<Inbound, SocketError>>>;

    struct FakeConnection {
        inbound: mpsc::UnboundedReceiver<Option<Result<Inbound, SocketError>>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Connection for FakeConnection {
        async fn recv(&mut self) -> Option<Result<Inbound, SocketError>> {
            self.inbound.recv().await.flatten()
        }

        async fn send_text(&mut self, text: String) -> Result<(), SocketError> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        async fn close(&mut self) {}
    }

    /// Hands out scripted connections in order, failing once the script runs out.
    #[derive(Default)]
    struct FakeConnector {
        attempts: AtomicUsize,
        script: Mutex<VecDeque<FakeConnection>>,
    }

    impl FakeConnector {
        fn failing() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn push_open(&self, sent: &Arc<Mutex<Vec<String>>>) -> Feed {
            let (tx, rx) = mpsc::unbounded_channel();
            self.script.lock().unwrap().push_back(FakeConnection {
                inbound: rx,
                sent: Arc::clone(sent),
            });
            tx
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(&self, _url: &str) -> Result<Box<dyn Connection>, SocketError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(connection) => Ok(Box::new(connection)),
                None => Err(SocketError::Connect(Box::new(WsError::ConnectionClosed))),
            }
        }
    }

    fn policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            delay: Duration::from_secs(2),
        }
    }

    fn recording_handlers(events: &Arc<Mutex<Vec<String>>>) -> SocketHandlers {
        let (m, o, c, e) = (
            Arc::clone(events),
            Arc::clone(events),
            Arc::clone(events),
            Arc::clone(events),
        );
        SocketHandlers::new()
            .on_message(move |text| m.lock().unwrap().push(format!("message:{text}")))
            .on_open(move || o.lock().unwrap().push("open".to_owned()))
            .on_close(move |_| c.lock().unwrap().push("close".to_owned()))
            .on_error(move |_| e.lock().unwrap().push("error".to_owned()))
    }

    async fn wait_for_state(socket: &ReconnectingSocket, wanted: ConnectionState) {
        socket
            .subscribe()
            .wait_for(|state| *state == wanted)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_endpoint_stops_after_max_attempts() {
        let connector = FakeConnector::failing();
        let started = Instant::now();
        let socket = ReconnectingSocket::connect_with(
            connector.clone(),
            "ws://unreachable",
            policy(3),
            SocketHandlers::new(),
        );

        socket.closed().await;
        assert_eq!(socket.state(), ConnectionState::ClosedGivingUp);
        // Initial attempt plus three reconnections, two seconds apart.
        assert_eq!(connector.attempts(), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(6));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_scheduled_retry() {
        let connector = FakeConnector::failing();
        let events = Arc::new(Mutex::new(Vec::new()));
        let socket = ReconnectingSocket::connect_with(
            connector.clone(),
            "ws://unreachable",
            policy(5),
            recording_handlers(&events),
        );

        wait_for_state(&socket, ConnectionState::ClosedWillRetry).await;
        assert_eq!(connector.attempts(), 1);

        socket.close();
        socket.closed().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(connector.attempts(), 1);
        assert_eq!(*events.lock().unwrap(), ["error", "close"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_when_not_open_never_reaches_transport() {
        let connector = FakeConnector::failing();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let feed = connector.push_open(&sent);
        let socket = ReconnectingSocket::connect_with(
            connector.clone(),
            "ws://test",
            policy(2),
            SocketHandlers::new(),
        );

        wait_for_state(&socket, ConnectionState::Open).await;
        socket.send(&json!({"type": "ping"})).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*sent.lock().unwrap(), [r#"{"type":"ping"}"#]);

        feed.send(Some(Ok(Inbound::Closed(None)))).unwrap();
        wait_for_state(&socket, ConnectionState::ClosedWillRetry).await;

        socket.send(&json!({"type": "late"})).unwrap();
        socket.closed().await;
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_messages_delivered_in_order_then_budget_spent() {
        let connector = Arc::new(FakeConnector::default());
        let sent = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let feed = connector.push_open(&sent);
        let socket = ReconnectingSocket::connect_with(
            connector.clone(),
            "ws://test",
            policy(2),
            recording_handlers(&events),
        );

        wait_for_state(&socket, ConnectionState::Open).await;
        for n in 1..=3 {
            feed.send(Some(Ok(Inbound::Text(format!("m{n}"))))).unwrap();
        }
        feed.send(None).unwrap();
        socket.closed().await;

        // One open connection, then the full budget of two reconnections.
        assert_eq!(connector.attempts(), 3);
        assert_eq!(
            *events.lock().unwrap(),
            [
                "open",
                "message:m1",
                "message:m2",
                "message:m3",
                "close",
                "error",
                "close",
                "error",
                "close"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_resets_after_reconnect() {
        let connector = Arc::new(FakeConnector::default());
        let sent = Arc::new(Mutex::new(Vec::new()));
        let first = connector.push_open(&sent);
        let second = connector.push_open(&sent);
        let socket = ReconnectingSocket::connect_with(
            connector.clone(),
            "ws://test",
            policy(1),
            SocketHandlers::new(),
        );

        wait_for_state(&socket, ConnectionState::Open).await;
        first.send(Some(Ok(Inbound::Closed(None)))).unwrap();
        wait_for_state(&socket, ConnectionState::ClosedWillRetry).await;
        wait_for_state(&socket, ConnectionState::Open).await;

        // A budget of one would already be spent without the reset.
        second.send(Some(Ok(Inbound::Closed(None)))).unwrap();
        socket.closed().await;
        assert_eq!(connector.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_counts_as_one_loss() {
        let connector = Arc::new(FakeConnector::default());
        let sent = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let feed = connector.push_open(&sent);
        let socket = ReconnectingSocket::connect_with(
            connector.clone(),
            "ws://test",
            policy(1),
            recording_handlers(&events),
        );

        wait_for_state(&socket, ConnectionState::Open).await;
        feed.send(Some(Err(SocketError::Transport(Box::new(WsError::ConnectionClosed)))))
            .unwrap();
        feed.send(Some(Ok(Inbound::Closed(None)))).unwrap();
        socket.closed().await;

        assert_eq!(connector.attempts(), 2);
        assert_eq!(
            *events.lock().unwrap(),
            ["open", "error", "close", "error", "close"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_reconnecting() {
        let connector = FakeConnector::failing();
        let socket = ReconnectingSocket::connect_with(
            connector.clone(),
            "ws://unreachable",
            policy(5),
            SocketHandlers::new(),
        );
        let mut state = socket.subscribe();
        state
            .wait_for(|s| *s == ConnectionState::ClosedWillRetry)
            .await
            .unwrap();

        drop(socket);
        let _ = state.wait_for(ConnectionState::is_terminal).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.attempts(), 1);
    }
}
