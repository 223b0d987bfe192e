//! Integration tests for the REST client: status handling, body decoding,
//! token refresh and the login/logout session lifecycle.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use causehive_client::{ApiClient, ApiError, ApiResponse, ClientConfig, ErrorBody, RequestBody};
use causehive_core::{CauseId, Email, MemorySessionStore, SessionKey, SessionStore};
use causehive_integration_tests::{MockBackend, unsigned_token};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

const USER_ID: &str = "5f0c1a7e-2b7d-4d4c-9c2e-3f1d7a0b9e11";
const CAUSE_ID: &str = "0d8f6a52-3c1e-4a8e-9d40-6f5d2b7c1e90";

fn empty_store() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::new())
}

fn access_token() -> String {
    unsigned_token(&json!({"token_type": "access", "user_id": USER_ID}))
}

fn profile() -> Value {
    json!({"id": 3, "user": USER_ID, "full_name": "Ama Mensah", "bio": "Nurse"})
}

// ============================================================================
// Status and body handling
// ============================================================================

#[tokio::test]
async fn test_not_found_surfaces_status_and_body() {
    let routes = Router::new().route(
        "/api/causes/details/{id}/",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))) }),
    );
    let backend = MockBackend::start(routes).await.unwrap();
    let client = backend.client(empty_store()).unwrap();

    let err = client
        .get_cause(CAUSE_ID.parse::<CauseId>().unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    let ApiError::Http {
        status_text, body, ..
    } = &err
    else {
        panic!("expected an HTTP error, got {err:?}");
    };
    assert_eq!(status_text, "Not Found");
    assert_eq!(ErrorBody::message_from(body).as_deref(), Some("Not found."));
}

#[tokio::test]
async fn test_unknown_route_is_an_http_error_with_empty_body() {
    let backend = MockBackend::start(Router::new()).await.unwrap();
    let client = backend.client(empty_store()).unwrap();

    let err = client
        .request(Method::GET, "/api/nowhere/", RequestBody::Empty)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(err.to_string().starts_with("HTTP 404"));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error_without_status() {
    // Bind then release a port so nothing is listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::with_api_url(format!("http://{addr}"));
    let client = ApiClient::new(&config, empty_store()).unwrap();

    let err = client
        .request(Method::GET, "/api/causes/list/", RequestBody::Empty)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    assert_eq!(err.status(), None);
    assert!(err.is_transport());
    assert!(!err.is_unauthorized());
}

#[tokio::test]
async fn test_json_and_text_responses() {
    let routes = Router::new()
        .route("/api/ping/", get(|| async { Json(json!({"ok": true})) }))
        .route("/api/health/", get(|| async { "pong" }))
        .route(
            "/api/empty/",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "") }),
        );
    let backend = MockBackend::start(routes).await.unwrap();
    let client = backend.client(empty_store()).unwrap();

    let json = client
        .request(Method::GET, "/api/ping/", RequestBody::Empty)
        .await
        .unwrap();
    assert_eq!(json, ApiResponse::Json(json!({"ok": true})));

    let text = client
        .request(Method::GET, "api/health/", RequestBody::Empty)
        .await
        .unwrap();
    assert_eq!(text, ApiResponse::Text("pong".to_owned()));

    let empty = client
        .request(Method::GET, "/api/empty/", RequestBody::Empty)
        .await
        .unwrap();
    assert_eq!(empty, ApiResponse::Json(Value::Null));
}

#[tokio::test]
async fn test_paginated_listing_sends_page_query() {
    let routes = Router::new().route(
        "/api/causes/list/",
        get(|| async {
            Json(json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [{
                    "id": CAUSE_ID,
                    "name": "Clean water for Tamale",
                    "target_amount": "1000.00",
                    "current_amount": "250.00",
                    "category": {"name": "Health"}
                }]
            }))
        }),
    );
    let backend = MockBackend::start(routes).await.unwrap();
    let client = backend.client(empty_store()).unwrap();

    let causes = client.list_causes(0).await.unwrap();

    assert_eq!(causes.items().len(), 1);
    assert_eq!(causes.total(), Some(1));
    assert!(!causes.has_next());
    assert_eq!(causes.items()[0].category_name(), Some("Health"));
    assert_eq!(backend.requests()[0].query.as_deref(), Some("page=1"));
}

// ============================================================================
// Tokens
// ============================================================================

#[tokio::test]
async fn test_persisted_token_is_sent_from_the_first_request() {
    let routes = Router::new().route("/api/user/profile/", get(|| async { Json(profile()) }));
    let backend = MockBackend::start(routes).await.unwrap();
    let store = Arc::new(MemorySessionStore::with_entries([(SessionKey::AccessToken, "persisted")]));
    let client = backend.client(store).unwrap();

    let profile = client.get_profile().await.unwrap();

    assert_eq!(profile.full_name.as_deref(), Some("Ama Mensah"));
    assert_eq!(backend.requests()[0].bearer(), Some("persisted"));
}

#[tokio::test]
async fn test_refresh_installs_new_access_token() {
    let fresh = access_token();
    let issued = fresh.clone();
    let routes = Router::new()
        .route(
            "/api/user/token/refresh/",
            post(move || {
                let issued = issued.clone();
                async move { Json(json!({"access": issued})) }
            }),
        )
        .route("/api/user/profile/", get(|| async { Json(profile()) }));
    let backend = MockBackend::start(routes).await.unwrap();
    let store = Arc::new(MemorySessionStore::with_entries([
        (SessionKey::AccessToken, "stale"),
        (SessionKey::RefreshToken, "r-1"),
    ]));
    let client = backend.client(store.clone()).unwrap();

    let token = client.refresh_access_token().await.unwrap();
    client.get_profile().await.unwrap();

    assert_eq!(token.expose_secret(), fresh);
    assert_eq!(store.get(SessionKey::AccessToken), Some(fresh.clone()));
    assert_eq!(store.get(SessionKey::RefreshToken).as_deref(), Some("r-1"));
    assert_eq!(store.get(SessionKey::UserId).as_deref(), Some(USER_ID));

    let requests = backend.requests();
    assert_eq!(requests[0].authorization, None);
    assert_eq!(requests[0].json(), Some(json!({"refresh": "r-1"})));
    assert_eq!(requests[1].bearer(), Some(fresh.as_str()));
}

#[tokio::test]
async fn test_failed_refresh_leaves_session_untouched() {
    let routes = Router::new().route(
        "/api/user/token/refresh/",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Token is invalid or expired"})),
            )
        }),
    );
    let backend = MockBackend::start(routes).await.unwrap();
    let store = Arc::new(MemorySessionStore::with_entries([
        (SessionKey::AccessToken, "stale"),
        (SessionKey::RefreshToken, "expired"),
    ]));
    let client = backend.client(store.clone()).unwrap();

    assert!(client.refresh_access_token().await.is_none());
    assert!(client.has_auth_token().await);
    assert_eq!(store.get(SessionKey::AccessToken).as_deref(), Some("stale"));
    assert_eq!(store.get(SessionKey::RefreshToken).as_deref(), Some("expired"));
}

#[tokio::test]
async fn test_refresh_without_refresh_token_makes_no_request() {
    let backend = MockBackend::start(Router::new()).await.unwrap();
    let client = backend.client(empty_store()).unwrap();

    assert!(client.refresh_access_token().await.is_none());
    assert!(backend.requests().is_empty());
}

// ============================================================================
// Login / logout
// ============================================================================

fn auth_routes(logout_status: StatusCode) -> Router {
    let access = access_token();
    Router::new()
        .route(
            "/api/user/auth/login/",
            post(move || {
                let access = access.clone();
                async move {
                    Json(json!({
                        "access": access,
                        "refresh": "r-9",
                        "user": {"id": USER_ID, "email": "ama@example.com", "first_name": "Ama"}
                    }))
                }
            }),
        )
        .route(
            "/api/user/auth/logout/",
            post(move || async move { (logout_status, Json(json!({"detail": "Logged out"}))) }),
        )
}

#[tokio::test]
async fn test_login_persists_tokens_and_logout_clears_them() {
    let backend = MockBackend::start(auth_routes(StatusCode::OK)).await.unwrap();
    let store = Arc::new(MemorySessionStore::with_entries([(SessionKey::CartId, "c-1")]));
    let client = backend.client(store.clone()).unwrap();
    let email: Email = "ama@example.com".parse().unwrap();

    let response = client
        .login(&email, &SecretString::from("hunter2".to_owned()))
        .await
        .unwrap();

    assert_eq!(response.user.map(|u| u.email).as_deref(), Some("ama@example.com"));
    assert!(client.has_auth_token().await);
    assert_eq!(store.get(SessionKey::AccessToken), Some(access_token()));
    assert_eq!(store.get(SessionKey::RefreshToken).as_deref(), Some("r-9"));
    assert_eq!(client.stored_user_id().as_deref(), Some(USER_ID));

    client.logout().await.unwrap();

    assert!(!client.has_auth_token().await);
    for key in [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::UserId,
        SessionKey::CartId,
    ] {
        assert_eq!(store.get(key), None, "{key} should be cleared");
    }

    let login = &backend.requests_to("/api/user/auth/login/")[0];
    assert_eq!(login.authorization, None);
    assert_eq!(
        login.json(),
        Some(json!({"email": "ama@example.com", "password": "hunter2"}))
    );

    let logout = &backend.requests_to("/api/user/auth/logout/")[0];
    assert_eq!(logout.bearer(), Some(access_token().as_str()));
    assert_eq!(logout.json(), Some(json!({"refresh": "r-9"})));
}

#[tokio::test]
async fn test_logout_clears_session_even_when_server_fails() {
    let backend = MockBackend::start(auth_routes(StatusCode::INTERNAL_SERVER_ERROR))
        .await
        .unwrap();
    let store = Arc::new(MemorySessionStore::with_entries([
        (SessionKey::AccessToken, "a"),
        (SessionKey::RefreshToken, "r"),
    ]));
    let client = backend.client(store.clone()).unwrap();

    let err = client.logout().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(!client.has_auth_token().await);
    assert_eq!(store.get(SessionKey::AccessToken), None);
    assert_eq!(store.get(SessionKey::RefreshToken), None);
}

#[tokio::test]
async fn test_rejected_login_stores_nothing() {
    let routes = Router::new().route(
        "/api/user/auth/login/",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "No active account found with the given credentials"})),
            )
        }),
    );
    let backend = MockBackend::start(routes).await.unwrap();
    let store = empty_store();
    let client = backend.client(store.clone()).unwrap();
    let email: Email = "ama@example.com".parse().unwrap();

    let err = client
        .login(&email, &SecretString::from("wrong".to_owned()))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!client.has_auth_token().await);
    assert_eq!(store.get(SessionKey::AccessToken), None);
}
