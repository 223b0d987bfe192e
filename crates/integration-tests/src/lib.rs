//! Integration test support for the CauseHive client.
//!
//! [`MockBackend`] serves an axum router on an ephemeral local port and
//! records every request it receives, so tests can drive a real
//! [`ApiClient`] (or a real WebSocket) and then assert on what went over the
//! wire.
//!
//! ```rust,ignore
//! let backend = MockBackend::start(
//!     Router::new().route("/api/cart/", get(|| async { Json(json!({"items": []})) })),
//! )
//! .await?;
//! let client = backend.client(Arc::new(MemorySessionStore::new()))?;
//! client.get_cart(None).await?;
//! assert_eq!(backend.requests()[0].query, None);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use causehive_client::{ApiClient, ApiError, ClientConfig};
use causehive_core::SessionStore;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as the mock backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body parsed as JSON, `None` if it is empty or not JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// The bearer token, if the request carried one.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.authorization.as_deref()?.strip_prefix("Bearer ")
    }

    /// Whether the body was sent as `multipart/form-data`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    }
}

#[derive(Debug, Clone, Default)]
struct RequestLog(Arc<Mutex<Vec<RecordedRequest>>>);

impl RequestLog {
    fn push(&self, request: RecordedRequest) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }

    fn snapshot(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// A local HTTP and WebSocket server standing in for the CauseHive backend.
///
/// Unmatched routes answer axum's default empty 404. The server stops when
/// the backend is dropped.
#[derive(Debug)]
pub struct MockBackend {
    addr: SocketAddr,
    log: RequestLog,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Serve `routes` on `127.0.0.1` with request recording in front.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start(routes: Router) -> std::io::Result<Self> {
        let log = RequestLog::default();
        let app = routes.layer(middleware::from_fn_with_state(log.clone(), record));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self { addr, log, server })
    }

    /// HTTP origin of the backend.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL for `path` on the backend.
    #[must_use]
    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            ws_url: self.ws_url("/ws"),
            ..ClientConfig::with_api_url(self.url())
        }
    }

    /// An API client for this backend backed by `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn client(&self, store: Arc<dyn SessionStore>) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.config(), store)
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.snapshot()
    }

    /// Requests received for `path`, oldest first.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let header_value = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    log.push(RecordedRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(str::to_owned),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body: body.clone(),
    });

    Ok(next.run(Request::from_parts(parts, Body::from(body))).await)
}

/// An unsigned JWT whose payload is `claims`.
///
/// The client only decodes the payload, so the signature is a placeholder.
#[must_use]
pub fn unsigned_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.unsigned")
}
