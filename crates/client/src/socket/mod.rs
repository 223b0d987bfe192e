//! Live notification socket.
//!
//! [`ReconnectingSocket`] keeps one duplex JSON message channel open to the
//! configured endpoint and re-establishes it after loss with a fixed delay
//! and a bounded number of attempts.
//!
//! ```no_run
//! use causehive_client::socket::{ReconnectPolicy, ReconnectingSocket, SocketHandlers};
//!
//! # async fn demo() {
//! let socket = ReconnectingSocket::connect(
//!     "ws://localhost:3000/ws",
//!     ReconnectPolicy::default(),
//!     SocketHandlers::new().on_message(|text| tracing::info!(%text, "notification")),
//! );
//! socket.closed().await;
//! # }
//! ```

mod client;
mod state;
mod transport;

pub use client::{ReconnectingSocket, SocketHandlers};
pub use state::{ConnectionState, Directive, ReconnectMachine, ReconnectPolicy, SocketEvent};
pub use transport::{CloseInfo, Connection, Connector, Inbound, SocketError, TungsteniteConnector};
