/**
 * API Routes
 *
 * Everything under `/api/v1`.
 *
 * # Public
 * - `POST /auth/register` - User registration
 * - `POST /auth/login` - User login
 *
 * # Protected (token in `Authorization: Bearer` or `?token=`)
 * - `POST /auth/logout` - Revoke the current token
 * - `GET /users/me` - Current user
 * - `GET /users?search=` - User directory
 * - `POST /conversations` - Create a conversation
 * - `GET /conversations` - The caller's conversations
 * - `GET /conversations/{id}/messages` - Message history
 * - `GET /ws` - WebSocket upgrade
 */

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::backend::auth::{get_me, login, logout, register};
use crate::backend::conversations::{create_conversation, list_conversations, list_messages};
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::ws_handler;
use crate::backend::server::state::AppState;
use crate::backend::users::list_users;

/// Build the `/api/v1` router
///
/// Protected routes go through `auth_middleware` via `route_layer`, so
/// unknown paths still 404 instead of 401.
pub fn api_routes(app_state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));

    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/users/me", get(get_me))
        .route("/users", get(list_users))
        .route("/conversations", post(create_conversation).get(list_conversations))
        .route("/conversations/{id}/messages", get(list_messages))
        .route("/ws", get(ws_handler))
        .route_layer(middleware::from_fn_with_state(app_state, auth_middleware));

    public.merge(protected)
}
