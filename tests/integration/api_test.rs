//! HTTP routing tests
//!
//! These run against a pool that never connects, so every request here must
//! be answered before the handler touches the database.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{auth_header, lazy_pool, test_tokens};
use chathub::backend::realtime::MemoryGateway;
use chathub::backend::routes::create_router;
use chathub::backend::server::AppState;
use chathub::shared::HubConfig;

fn test_router() -> Router {
    let state = AppState::new(
        lazy_pool(),
        test_tokens(),
        HubConfig::default(),
        Arc::new(MemoryGateway::new()),
    );
    create_router(state)
}

async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = test_router().oneshot(request).await.expect("infallible service");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_hub_load() {
    let (status, body) = send(get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"status": "ok", "connected_users": 0, "sessions": 0})
    );
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    for uri in [
        "/api/v1/users/me",
        "/api/v1/users",
        "/api/v1/conversations",
        "/api/v1/conversations/1/messages",
    ] {
        let (status, body) = send(get(uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["status"], 401);
        assert_eq!(body["error"], "Authorization token required");
    }
}

#[tokio::test]
async fn test_websocket_upgrade_without_token_is_rejected() {
    let request = Request::builder()
        .uri("/api/v1/ws")
        .header(header::CONNECTION, "upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_VERSION, "13")
        .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let request = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::AUTHORIZATION, auth_header("not.a.jwt"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_query_token_signed_elsewhere_is_rejected() {
    let foreign = chathub::backend::auth::TokenConfig::new(
        "some-other-secret".to_string(),
        std::time::Duration::from_secs(60),
    )
    .create_token(1)
    .unwrap();

    let (status, _) = send(get(&format!("/api/v1/ws?token={}", foreign))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_fails_before_database() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"username":"al","email":"al@example.com","password":"secret1"}"#,
        ))
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = send(get("/api/v1/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
