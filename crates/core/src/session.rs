//! Persisted client-side session state.
//!
//! The client keeps a handful of strings across runs: the bearer and refresh
//! tokens, the user ID derived from the access token, the sticky cart ID and
//! the last payment reference. Storage is abstracted behind [`SessionStore`]
//! and injected into every client instance, so several clients can share one
//! store explicitly and tests can use [`MemorySessionStore`].
//!
//! Writes are whole-value overwrites; concurrent writers are not coordinated
//! and the last write wins.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Fixed keys under which session values are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKey {
    /// Current bearer credential.
    #[serde(rename = "access")]
    AccessToken,
    /// Credential used only to mint new access tokens.
    #[serde(rename = "refresh")]
    RefreshToken,
    /// Best-effort user identifier decoded from the access token.
    UserId,
    /// Sticky cart reference for anonymous and signed-in donors.
    CartId,
    /// Reference of the most recently initiated payment.
    LastPaymentReference,
}

impl SessionKey {
    /// Every key, in storage order.
    pub const ALL: [Self; 5] = [
        Self::AccessToken,
        Self::RefreshToken,
        Self::UserId,
        Self::CartId,
        Self::LastPaymentReference,
    ];

    /// The storage name of this key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access",
            Self::RefreshToken => "refresh",
            Self::UserId => "user_id",
            Self::CartId => "cart_id",
            Self::LastPaymentReference => "last_payment_reference",
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value storage for session state.
///
/// Implementations must be cheap to call from async code; they are invoked
/// inline, never on a blocking pool.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: SessionKey) -> Option<String>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: SessionKey, value: &str);

    /// Remove the value stored under `key`.
    fn remove(&self, key: SessionKey);

    /// Remove every session value.
    fn clear(&self) {
        for key in SessionKey::ALL {
            self.remove(key);
        }
    }
}

/// In-process session store.
///
/// Nothing survives the process; suited to tests and to short-lived tools.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (SessionKey, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(key, value)| (key, value.to_owned()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: SessionKey, value: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_owned());
    }

    fn remove(&self, key: SessionKey) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }

    fn clear(&self) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
