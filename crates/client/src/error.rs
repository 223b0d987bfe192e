//! Error types for the CauseHive REST client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the CauseHive backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Numeric status returned by the server.
        status: StatusCode,
        /// Canonical reason phrase for the status.
        status_text: String,
        /// Raw response body, empty if it could not be read.
        body: String,
    },

    /// The request never completed (unreachable host, DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A JSON body could not be encoded or a response could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request could not be built (bad header value, bad MIME type).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failure, `None` for non-HTTP failures.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Whether the failure happened below HTTP.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Error body shape used by most backend endpoints (`{"error": "..."}` or
/// `{"detail": "..."}`).
#[derive(Debug, serde::Deserialize)]
pub struct ErrorBody {
    /// Application error message.
    #[serde(default)]
    pub error: Option<String>,
    /// Framework error message.
    #[serde(default)]
    pub detail: Option<String>,
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extract the most specific human-readable message from an error body.
    #[must_use]
    pub fn message_from(body: &str) -> Option<String> {
        let parsed: Self = serde_json::from_str(body).ok()?;
        parsed.error.or(parsed.detail).or(parsed.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_and_status() {
        let err = ApiError::Http {
            status: StatusCode::NOT_FOUND,
            status_text: "Not Found".to_owned(),
            body: "{\"detail\":\"Not found.\"}".to_owned(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(!err.is_unauthorized());
        assert!(!err.is_transport());
        assert_eq!(
            err.to_string(),
            "HTTP 404 Not Found: {\"detail\":\"Not found.\"}"
        );
    }

    #[test]
    fn test_non_http_errors_have_no_status() {
        let err = ApiError::InvalidRequest("bad header".to_owned());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_body_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"error":"Cart is empty"}"#).as_deref(),
            Some("Cart is empty")
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"detail":"Authentication credentials were not provided."}"#)
                .as_deref(),
            Some("Authentication credentials were not provided.")
        );
        assert_eq!(ErrorBody::message_from("<html>oops</html>"), None);
    }
}
