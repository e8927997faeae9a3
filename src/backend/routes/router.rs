/**
 * Router Configuration
 *
 * Combines the health check and the `/api/v1` routes into a single Axum
 * router, with permissive CORS and request tracing on every route.
 */

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::realtime::HubHandle;
use crate::backend::routes::api_routes::api_routes;
use crate::backend::server::state::AppState;

/// Body of `GET /health`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub connected_users: usize,
    pub sessions: usize,
}

/// Liveness plus the hub's current load
///
/// Reports `degraded` if the hub task is no longer answering.
pub async fn health(State(hub): State<HubHandle>) -> Json<HealthResponse> {
    let response = match hub.snapshot().await {
        Some(snapshot) => HealthResponse {
            status: "ok".to_string(),
            connected_users: snapshot.connected_users(),
            sessions: snapshot.session_count(),
        },
        None => HealthResponse {
            status: "degraded".to_string(),
            connected_users: 0,
            sessions: 0,
        },
    };
    Json(response)
}

/// Create the Axum router with all routes configured
///
/// - `GET /health` - Health check
/// - `/api/v1/...` - see `api_routes`
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes(app_state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
