//! Best-effort decoding of JWT access-token payloads.
//!
//! The client never verifies signatures; it only peeks at the payload to
//! recover convenience values such as the user ID and expiry. Every failure
//! (too few segments, bad base64, non-JSON payload) yields `None`.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Claim names that may carry the user identifier, in lookup order.
pub const USER_ID_CLAIMS: [&str; 3] = ["user_id", "id", "sub"];

/// Standard alphabet with optional padding; URL-safe characters are mapped
/// onto it before decoding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded JWT payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    claims: Map<String, Value>,
}

impl TokenClaims {
    /// Decode the payload segment of `token`.
    ///
    /// Returns `None` if the token has fewer than three segments, the payload
    /// is not base64, or it does not decode to a JSON object.
    #[must_use]
    pub fn decode(token: &str) -> Option<Self> {
        let mut segments = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return None;
        };

        let standard: String = payload
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();

        let bytes = PAYLOAD_ENGINE.decode(standard).ok()?;
        match serde_json::from_slice(&bytes).ok()? {
            Value::Object(claims) => Some(Self { claims }),
            _ => None,
        }
    }

    /// Look up a raw claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The user identifier, taken from the first of [`USER_ID_CLAIMS`] that
    /// holds a non-empty string or a number.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        USER_ID_CLAIMS
            .iter()
            .filter_map(|name| self.claims.get(*name))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Expiry (`exp`) as a timestamp, if present.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.claims.get("exp")?.as_i64()?;
        DateTime::from_timestamp(exp, 0)
    }

    /// Whether the token expires within `leeway_secs` seconds from now.
    ///
    /// Tokens without an `exp` claim are never considered expired.
    #[must_use]
    pub fn expires_within(&self, leeway_secs: i64) -> bool {
        self.expires_at()
            .is_some_and(|at| Utc::now().timestamp() >= at.timestamp() - leeway_secs)
    }

    /// Consume the claims and return the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.claims
    }
}

/// Shorthand for `TokenClaims::decode(token)?.user_id()`.
#[must_use]
pub fn user_id_from_token(token: &str) -> Option<String> {
    TokenClaims::decode(token)?.user_id()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn token_with(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_user_id_claim_round_trip() {
        let payload = json!({
            "token_type": "access",
            "user_id": "5f0c1a7e-2b7d-4d4c-9c2e-3f1d7a0b9e11",
            "exp": 4_102_444_800_i64
        });
        let token = token_with(&payload);

        let claims = TokenClaims::decode(&token).unwrap();
        assert_eq!(
            claims.user_id().as_deref(),
            Some("5f0c1a7e-2b7d-4d4c-9c2e-3f1d7a0b9e11")
        );
        assert_eq!(Value::Object(claims.into_inner()), payload);
    }

    #[test]
    fn test_user_id_claim_precedence_and_numbers() {
        let token = token_with(&json!({"sub": "subject", "id": 17}));
        assert_eq!(user_id_from_token(&token).as_deref(), Some("17"));

        let token = token_with(&json!({"sub": "subject", "user_id": ""}));
        assert_eq!(user_id_from_token(&token).as_deref(), Some("subject"));

        let token = token_with(&json!({"scope": "read"}));
        assert_eq!(user_id_from_token(&token), None);
    }

    #[test]
    fn test_url_safe_characters_are_accepted() {
        // {"user_id":"???"} and {"user_id":">>>"} in URL-safe base64.
        let underscore = "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyX2lkIjoiPz8_In0.sig";
        assert_eq!(user_id_from_token(underscore).as_deref(), Some("???"));

        let dash = "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyX2lkIjoiPj4-In0.sig";
        assert_eq!(user_id_from_token(dash).as_deref(), Some(">>>"));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let body = base64::engine::general_purpose::STANDARD.encode(br#"{"user_id":"ab"}"#);
        assert!(body.ends_with('='));
        let token = format!("h.{body}.s");
        assert_eq!(user_id_from_token(&token).as_deref(), Some("ab"));
    }

    #[test]
    fn test_malformed_tokens_decode_to_none() {
        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        let array = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        let cases = [
            String::new(),
            "onlyone".to_owned(),
            "two.segments".to_owned(),
            "a.!!!not-base64!!!.c".to_owned(),
            format!("a.{not_json}.c"),
            format!("a.{array}.c"),
            "a.e30".to_owned(),
        ];
        for token in &cases {
            assert!(TokenClaims::decode(token).is_none(), "decoded {token:?}");
            assert!(user_id_from_token(token).is_none());
        }
    }

    #[test]
    fn test_truncated_payload_decodes_to_none() {
        let token = token_with(&json!({"user_id": "abc", "exp": 1}));
        let mut parts = token.split('.');
        let header = parts.next().unwrap();
        let body = parts.next().unwrap();
        let truncated = format!("{header}.{}.sig", &body[..body.len() / 2]);
        assert!(TokenClaims::decode(&truncated).is_none());
    }

    #[test]
    fn test_expiry() {
        let expired = TokenClaims::decode(&token_with(&json!({"exp": 1}))).unwrap();
        assert!(expired.expires_within(0));
        assert_eq!(expired.expires_at().unwrap().timestamp(), 1);

        let far = TokenClaims::decode(&token_with(&json!({"exp": 4_102_444_800_i64}))).unwrap();
        assert!(!far.expires_within(60));

        let none = TokenClaims::decode(&token_with(&json!({}))).unwrap();
        assert!(!none.expires_within(60));
    }
}
