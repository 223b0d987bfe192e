//! CauseHive Core - Shared types library.
//!
//! This crate provides the pieces of the CauseHive client that never touch
//! the network. It is shared by:
//! - `causehive-client` - REST client and reconnecting notification socket
//! - `causehive-cli` - Command-line front end for the donation platform
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no sockets, no HTTP
//! clients, no files. Session persistence is expressed as the
//! [`SessionStore`] trait so that the client crate can inject a file-backed
//! store while tests use [`MemorySessionStore`].
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, amounts, emails, and statuses
//! - [`session`] - Persisted session keys and the store abstraction
//! - [`jwt`] - Best-effort decoding of access-token payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod jwt;
pub mod session;
pub mod types;

pub use jwt::TokenClaims;
pub use session::{MemorySessionStore, SessionKey, SessionStore};
pub use types::*;
