//! CauseHive client - REST access and live notifications for the CauseHive
//! donation platform.
//!
//! # Overview
//!
//! - [`ApiClient`] wraps the backend's REST API: bearer authentication from a
//!   persisted session, token refresh, sticky cart IDs, JSON and multipart
//!   bodies, and one typed method per endpoint.
//! - [`socket::ReconnectingSocket`] keeps a WebSocket open for live
//!   notifications, reconnecting with a fixed delay and a bounded number of
//!   attempts.
//!
//! Session state lives behind [`causehive_core::SessionStore`]; use
//! [`FileSessionStore`] to persist it across runs.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use causehive_client::{ApiClient, ClientConfig, FileSessionStore};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileSessionStore::open(".causehive-session.json"));
//! let client = ApiClient::new(&config, store)?;
//! let causes = client.list_causes(1).await?;
//! for cause in causes.items() {
//!     tracing::info!(name = %cause.name, "cause");
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod multipart;
pub mod socket;
pub mod store;

pub use api::{CartEntry, DonationRequest, NewCause, PaymentRequest, ProfileUpdate, Registration};
pub use client::{ApiClient, ApiResponse, RequestBody};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorBody};
pub use multipart::{FilePart, MultipartForm};
pub use store::FileSessionStore;

pub use reqwest::{Method, StatusCode};
