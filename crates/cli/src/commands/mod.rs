//! Command implementations.
//!
//! Each submodule maps one command group onto [`ApiClient`] calls and prints
//! the result through [`output`].

pub mod account;
pub mod cart;
pub mod causes;
pub mod donations;
pub mod notifications;
pub mod output;

use causehive_client::{ApiClient, ApiError, ClientConfig, ConfigError, ErrorBody};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The backend rejected the request or could not be reached.
    #[error("{}", describe_api_error(.0))]
    Api(#[from] ApiError),

    /// A local file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The live feed gave up reconnecting.
    #[error("Notification feed at {0} is unreachable")]
    FeedUnavailable(String),

    /// An argument was missing or inconsistent.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Prefer the server's own message over the raw response body.
fn describe_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Http { status, body, .. } => ErrorBody::message_from(body).map_or_else(
            || error.to_string(),
            |message| format!("HTTP {status}: {message}"),
        ),
        _ => error.to_string(),
    }
}

/// Everything a command needs.
pub struct Context {
    pub config: ClientConfig,
    pub client: ApiClient,
}
