//! Core types for CauseHive.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod email;
pub mod id;
pub mod status;

pub use amount::{Amount, AmountError, CurrencyCode};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
