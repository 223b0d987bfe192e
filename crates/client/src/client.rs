//! CauseHive REST client.
//!
//! Wraps a `reqwest::Client` bound to one base URL, attaches the current
//! bearer token to every request, and keeps the session store in sync with
//! the tokens it is given. Typed endpoint methods live in [`crate::api`].

use std::sync::Arc;

use causehive_core::{SessionKey, SessionStore, TokenClaims, jwt};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::RefreshResponse;
use crate::multipart::MultipartForm;

/// Token refresh endpoint.
pub(crate) const REFRESH_PATH: &str = "/api/user/token/refresh/";

/// Request body.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON body, sent with `Content-Type: application/json`.
    Json(Value),
    /// Multipart body; the boundary content type is set by the encoder.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Serialise `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if `value` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    /// The server declared a JSON content type. An empty body is `Null`.
    Json(Value),
    /// Any other content type, as text.
    Text(String),
}

impl ApiResponse {
    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body does not match `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value)?),
            Self::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }

    /// The JSON value, if the response was JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

/// CauseHive REST client.
///
/// Cloning is cheap and clones share one bearer token and one connection
/// pool. Separate instances share nothing but the injected [`SessionStore`].
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    bearer: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("bearer", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config.api_url`.
    ///
    /// A persisted access token, if any, becomes the initial bearer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::Transport)?;

        let bearer = persisted_access_token(store.as_ref());

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.trim_end_matches('/').to_owned(),
                store,
                bearer: RwLock::new(bearer),
            }),
        })
    }

    /// Base URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The session store backing this client.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    /// Replace or clear the bearer token of this instance.
    ///
    /// Only affects requests built afterwards; the store is not touched.
    pub async fn set_auth_token(&self, token: Option<SecretString>) {
        *self.inner.bearer.write().await = token;
    }

    /// Whether a bearer token is installed.
    pub async fn has_auth_token(&self) -> bool {
        self.inner.bearer.read().await.is_some()
    }

    /// Claims of the installed access token, `None` without a token or when
    /// it does not decode.
    pub async fn access_token_claims(&self) -> Option<TokenClaims> {
        let bearer = self.inner.bearer.read().await;
        TokenClaims::decode(bearer.as_ref()?.expose_secret())
    }

    /// Persist a freshly issued token pair and start using the access token.
    ///
    /// The user ID is decoded from the access token when possible; a token
    /// that does not decode is still stored and used.
    pub async fn set_session_tokens(&self, access: &SecretString, refresh: &SecretString) {
        let store = &self.inner.store;
        store.set(SessionKey::AccessToken, access.expose_secret());
        store.set(SessionKey::RefreshToken, refresh.expose_secret());
        self.remember_user_id(access);
        self.set_auth_token(Some(access.clone())).await;
    }

    /// Re-read the persisted access token into the bearer, picking up a
    /// login or logout performed by another client sharing the store.
    pub async fn reload_session(&self) {
        let token = persisted_access_token(self.inner.store.as_ref());
        self.set_auth_token(token).await;
    }

    /// Forget the bearer and remove every persisted session value.
    pub async fn clear_session(&self) {
        self.inner.store.clear();
        self.set_auth_token(None).await;
    }

    /// User ID decoded from the last stored access token.
    #[must_use]
    pub fn stored_user_id(&self) -> Option<String> {
        self.inner.store.get(SessionKey::UserId)
    }

    /// The persisted cart ID.
    #[must_use]
    pub fn stored_cart_id(&self) -> Option<String> {
        non_empty(self.inner.store.get(SessionKey::CartId))
    }

    /// Reference of the most recently started payment.
    #[must_use]
    pub fn last_payment_reference(&self) -> Option<String> {
        non_empty(self.inner.store.get(SessionKey::LastPaymentReference))
    }

    /// Explicit cart ID, else the persisted one.
    pub(crate) fn resolve_cart_id(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .or_else(|| self.stored_cart_id())
    }

    /// Persist a cart ID returned by the server.
    pub(crate) fn remember_cart_id(&self, cart_id: Option<&str>) {
        if let Some(id) = cart_id.filter(|id| !id.is_empty()) {
            self.inner.store.set(SessionKey::CartId, id);
        }
    }

    /// Persist a payment reference returned by the server.
    pub(crate) fn remember_payment_reference(&self, reference: Option<&str>) {
        if let Some(reference) = reference.filter(|r| !r.is_empty()) {
            self.inner.store.set(SessionKey::LastPaymentReference, reference);
        }
    }

    fn remember_user_id(&self, access: &SecretString) {
        match jwt::user_id_from_token(access.expose_secret()) {
            Some(user_id) => self.inner.store.set(SessionKey::UserId, &user_id),
            None => debug!("Access token carries no decodable user id"),
        }
    }

    /// Send a request to `path` (relative to the base URL).
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] for any non-2xx status, carrying the body text.
    /// - [`ApiError::Transport`] if no response was received.
    /// - [`ApiError::Parse`] if a JSON response does not parse.
    /// - [`ApiError::InvalidRequest`] if a multipart body cannot be encoded.
    #[instrument(skip(self, body), fields(base_url = %self.inner.base_url))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        self.execute(method, path, body, Auth::Bearer).await
    }

    /// Send a request and decode the response into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::request`].
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        self.request(method, path, body).await?.into_json()
    }

    /// Exchange the persisted refresh token for a new access token.
    ///
    /// Returns `None`, without touching the session, when no refresh token
    /// is stored or the exchange fails for any reason. On success the new
    /// access token is persisted and installed; the refresh token is kept.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Option<SecretString> {
        let Some(refresh) = non_empty(self.inner.store.get(SessionKey::RefreshToken)) else {
            debug!("No refresh token stored, skipping refresh");
            return None;
        };

        let body = RequestBody::Json(json!({ "refresh": refresh }));
        let response = match self
            .execute(Method::POST, REFRESH_PATH, body, Auth::Anonymous)
            .await
            .and_then(ApiResponse::into_json::<RefreshResponse>)
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Access token refresh failed");
                return None;
            }
        };

        let access = SecretString::from(response.access);
        self.inner
            .store
            .set(SessionKey::AccessToken, access.expose_secret());
        self.remember_user_id(&access);
        self.set_auth_token(Some(access.clone())).await;
        debug!("Access token refreshed");
        Some(access)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        auth: Auth,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(path);
        let mut builder = self.inner.http.request(method.clone(), &url);

        if auth == Auth::Bearer
            && let Some(token) = self.inner.bearer.read().await.as_ref()
        {
            builder = builder.bearer_auth(token.expose_secret());
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form.into_form().inspect_err(|e| {
                error!(%method, %url, error = %e, "Failed to encode multipart body");
            })?),
        };

        let response = builder.send().await.map_err(|e| {
            error!(%method, %url, error = %e, "API request failed");
            ApiError::Transport(e)
        })?;

        read_response(&method, &url, response).await
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        }
    }
}

async fn read_response(method: &Method, url: &str, response: Response) -> Result<ApiResponse, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::Http {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        };
        error!(%method, %url, status = status.as_u16(), error = %err, "API request failed");
        return Err(err);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_json_content_type);

    let text = response.text().await.map_err(|e| {
        error!(%method, %url, error = %e, "Failed to read response body");
        ApiError::Transport(e)
    })?;

    if !is_json {
        return Ok(ApiResponse::Text(text));
    }
    if text.trim().is_empty() {
        return Ok(ApiResponse::Json(Value::Null));
    }
    serde_json::from_str(&text).map(ApiResponse::Json).map_err(|e| {
        error!(%method, %url, error = %e, "Failed to parse JSON response");
        ApiError::Parse(e)
    })
}

/// Whether a `Content-Type` value names JSON (`application/json` or any
/// `+json` suffix type).
fn is_json_content_type(value: &str) -> bool {
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn persisted_access_token(store: &dyn SessionStore) -> Option<SecretString> {
    non_empty(store.get(SessionKey::AccessToken)).map(SecretString::from)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use causehive_core::MemorySessionStore;

    use super::*;

    fn client_with(store: Arc<dyn SessionStore>) -> ApiClient {
        ApiClient::new(&ClientConfig::with_api_url("http://127.0.0.1:9/"), store).unwrap()
    }

    #[test]
    fn test_json_content_type_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("Application/JSON"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn test_url_joining() {
        let client = client_with(Arc::new(MemorySessionStore::new()));
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
        assert_eq!(client.url("/api/cart/"), "http://127.0.0.1:9/api/cart/");
        assert_eq!(client.url("api/cart/"), "http://127.0.0.1:9/api/cart/");
    }

    #[tokio::test]
    async fn test_new_loads_persisted_token() {
        let store = Arc::new(MemorySessionStore::with_entries([(SessionKey::AccessToken, "tok")]));
        assert!(client_with(store).has_auth_token().await);

        let empty = Arc::new(MemorySessionStore::with_entries([(SessionKey::AccessToken, "")]));
        assert!(!client_with(empty).has_auth_token().await);
    }

    #[tokio::test]
    async fn test_set_session_tokens_persists_and_decodes() {
        let store = Arc::new(MemorySessionStore::new());
        let client = client_with(store.clone());

        // {"user_id":"???"}
        let access = SecretString::from("eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyX2lkIjoiPz8_In0.sig");
        let refresh = SecretString::from("refresh-token");
        client.set_session_tokens(&access, &refresh).await;

        assert_eq!(
            store.get(SessionKey::AccessToken).as_deref(),
            Some("eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyX2lkIjoiPz8_In0.sig")
        );
        assert_eq!(store.get(SessionKey::RefreshToken).as_deref(), Some("refresh-token"));
        assert_eq!(client.stored_user_id().as_deref(), Some("???"));
        assert!(client.has_auth_token().await);
    }

    #[tokio::test]
    async fn test_access_token_claims_follow_the_bearer() {
        let client = client_with(Arc::new(MemorySessionStore::new()));
        assert!(client.access_token_claims().await.is_none());

        // {"user_id":"???","exp":4102444800}
        let access = "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyX2lkIjoiPz8_IiwiZXhwIjo0MTAyNDQ0ODAwfQ.sig";
        client.set_auth_token(Some(SecretString::from(access))).await;
        let claims = client.access_token_claims().await.unwrap();
        assert_eq!(claims.expires_at().unwrap().timestamp(), 4_102_444_800);
        assert!(!claims.expires_within(60));

        client.set_auth_token(Some(SecretString::from("opaque"))).await;
        assert!(client.access_token_claims().await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_token_is_still_installed() {
        let store = Arc::new(MemorySessionStore::new());
        let client = client_with(store.clone());
        client
            .set_session_tokens(&SecretString::from("opaque"), &SecretString::from("r"))
            .await;

        assert_eq!(store.get(SessionKey::AccessToken).as_deref(), Some("opaque"));
        assert_eq!(client.stored_user_id(), None);
        assert!(client.has_auth_token().await);
    }

    #[tokio::test]
    async fn test_set_auth_token_is_per_instance() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let first = client_with(store.clone());
        let second = client_with(store);
        let clone = first.clone();

        first.set_auth_token(Some(SecretString::from("t"))).await;
        assert!(clone.has_auth_token().await);
        assert!(!second.has_auth_token().await);

        first
            .set_session_tokens(&SecretString::from("a"), &SecretString::from("r"))
            .await;
        assert!(!second.has_auth_token().await);
        second.reload_session().await;
        assert!(second.has_auth_token().await);
    }

    #[tokio::test]
    async fn test_clear_session() {
        let store = Arc::new(MemorySessionStore::with_entries([
            (SessionKey::AccessToken, "a"),
            (SessionKey::RefreshToken, "r"),
            (SessionKey::CartId, "c"),
        ]));
        let client = client_with(store.clone());
        client.clear_session().await;

        assert!(!client.has_auth_token().await);
        assert!(SessionKey::ALL.iter().all(|key| store.get(*key).is_none()));
    }

    #[tokio::test]
    async fn test_refresh_without_token_makes_no_call() {
        let store = Arc::new(MemorySessionStore::with_entries([(SessionKey::AccessToken, "old")]));
        let client = client_with(store.clone());

        assert!(client.refresh_access_token().await.is_none());
        assert_eq!(store.get(SessionKey::AccessToken).as_deref(), Some("old"));
        assert!(client.has_auth_token().await);
    }

    #[test]
    fn test_cart_id_resolution() {
        let store = Arc::new(MemorySessionStore::new());
        let client = client_with(store);
        assert_eq!(client.resolve_cart_id(None), None);
        assert_eq!(client.resolve_cart_id(Some("  ")), None);

        client.remember_cart_id(Some("stored"));
        assert_eq!(client.resolve_cart_id(None).as_deref(), Some("stored"));
        assert_eq!(client.resolve_cart_id(Some("explicit")).as_deref(), Some("explicit"));

        client.remember_cart_id(Some(""));
        assert_eq!(client.stored_cart_id().as_deref(), Some("stored"));
    }

    #[test]
    fn test_api_response_into_json() {
        let json = ApiResponse::Json(serde_json::json!({"a": 1}));
        assert_eq!(json.as_json().unwrap()["a"], 1);
        let value: serde_json::Map<String, Value> = json.into_json().unwrap();
        assert_eq!(value["a"], 1);

        let text = ApiResponse::Text("[1,2]".to_owned());
        assert_eq!(text.as_json(), None);
        assert_eq!(text.into_json::<Vec<u8>>().unwrap(), vec![1, 2]);

        let html = ApiResponse::Text("<html>".to_owned());
        assert!(matches!(html.into_json::<Value>(), Err(ApiError::Parse(_))));
    }
}
