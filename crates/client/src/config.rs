//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! Every variable is optional. URL settings take the first non-empty value of
//! a specific override, a generic fallback, and a built-in default.
//!
//! - `CAUSEHIVE_API_URL`, then `API_URL` - REST base URL (default: `http://localhost:8000`)
//! - `CAUSEHIVE_WS_URL`, then `WEBSOCKET_URL` - Notification socket URL (default: `ws://localhost:3000/ws`)
//! - `CAUSEHIVE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `CAUSEHIVE_WS_MAX_RECONNECTS` - Reconnection attempts before giving up (default: 5)
//! - `CAUSEHIVE_WS_RECONNECT_DELAY_MS` - Fixed delay between attempts (default: 2000)

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::socket::ReconnectPolicy;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_WS_URL: &str = "ws://localhost:3000/ws";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// CauseHive client configuration.
///
/// Resolved once; a client built from it keeps the same base URL for its
/// whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST API origin, without a trailing slash.
    pub api_url: String,
    /// Notification socket endpoint.
    pub ws_url: String,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
    /// Reconnection behaviour of the notification socket.
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            ws_url: DEFAULT_WS_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a URL does not parse or a numeric setting is
    /// not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = resolve_url(&lookup, "CAUSEHIVE_API_URL", "API_URL", DEFAULT_API_URL)?;
        let ws_url = resolve_url(&lookup, "CAUSEHIVE_WS_URL", "WEBSOCKET_URL", DEFAULT_WS_URL)?;

        let timeout_secs = parse_or_default(&lookup, "CAUSEHIVE_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let defaults = ReconnectPolicy::default();
        let max_attempts =
            parse_or_default(&lookup, "CAUSEHIVE_WS_MAX_RECONNECTS", defaults.max_attempts)?;
        let delay_ms = parse_or_default(
            &lookup,
            "CAUSEHIVE_WS_RECONNECT_DELAY_MS",
            u64::try_from(defaults.delay.as_millis()).unwrap_or(u64::MAX),
        )?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            ws_url,
            request_timeout: Duration::from_secs(timeout_secs),
            reconnect: ReconnectPolicy {
                max_attempts,
                delay: Duration::from_millis(delay_ms),
            },
        })
    }

    /// Build a configuration for a specific API origin, keeping every other
    /// setting at its default.
    #[must_use]
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Return the first candidate that is present and not blank.
fn first_non_empty<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}

/// Resolve a URL from override, fallback, default, and validate it.
fn resolve_url(
    lookup: &impl Fn(&str) -> Option<String>,
    primary_key: &str,
    fallback_key: &str,
    default: &str,
) -> Result<String, ConfigError> {
    let value = first_non_empty([lookup(primary_key), lookup(fallback_key)])
        .unwrap_or_else(|| default.to_owned());

    Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(primary_key.to_owned(), e.to_string()))?;
    Ok(value)
}

/// Parse a numeric variable, falling back to `default` when unset or blank.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    first_non_empty([lookup(key)]).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.ws_url, "ws://localhost:3000/ws");
        assert_eq!(config.reconnect.max_attempts, 5);
        assert_eq!(config.reconnect.delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_override_wins_over_fallback() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAUSEHIVE_API_URL", "https://api.causehive.test/"),
            ("API_URL", "https://fallback.test"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://api.causehive.test");
    }

    #[test]
    fn test_blank_override_falls_through() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAUSEHIVE_API_URL", "   "),
            ("API_URL", "https://fallback.test"),
            ("CAUSEHIVE_WS_URL", ""),
            ("WEBSOCKET_URL", "wss://push.causehive.test/ws"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://fallback.test");
        assert_eq!(config.ws_url, "wss://push.causehive.test/ws");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("CAUSEHIVE_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CAUSEHIVE_API_URL"));
    }

    #[test]
    fn test_numeric_settings() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAUSEHIVE_HTTP_TIMEOUT_SECS", "5"),
            ("CAUSEHIVE_WS_MAX_RECONNECTS", "3"),
            ("CAUSEHIVE_WS_RECONNECT_DELAY_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.reconnect.delay, Duration::from_millis(250));

        let err = ClientConfig::from_lookup(lookup(&[("CAUSEHIVE_WS_MAX_RECONNECTS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_with_api_url_trims_trailing_slash() {
        let config = ClientConfig::with_api_url("http://127.0.0.1:9000/");
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
    }
}
