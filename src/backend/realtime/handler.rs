/**
 * WebSocket Entry Point
 *
 * `GET /api/v1/ws` sits behind the auth middleware, so by the time the
 * upgrade handler runs the caller is a known user. Unauthenticated requests
 * are rejected with 401 before any upgrade or session exists.
 *
 * The upgrade is capped at `max_frame_bytes`; oversized frames fail the
 * read and end the session.
 */

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::StreamExt;

use crate::backend::middleware::AuthUser;
use crate::backend::realtime::fanout::FanoutRouter;
use crate::backend::realtime::hub::HubHandle;
use crate::backend::realtime::session::{run_session, SessionReport};
use crate::backend::server::state::AppState;
use crate::shared::messaging::UserId;
use crate::shared::HubConfig;

/// Upgrade an authenticated request to a WebSocket session
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Response {
    let user_id = auth.user.id;
    let config = state.hub_config.clone();
    tracing::debug!("[Realtime] Upgrading connection for user {}", user_id);

    ws.max_frame_size(config.max_frame_bytes)
        .max_message_size(config.max_frame_bytes)
        .on_upgrade(move |socket| async move {
            serve_socket(socket, user_id, state.hub, state.fanout, config).await;
        })
}

/// Run a session over an upgraded socket until it closes
pub async fn serve_socket(
    socket: WebSocket,
    user_id: UserId,
    hub: HubHandle,
    fanout: FanoutRouter,
    config: HubConfig,
) -> SessionReport {
    let (sink, stream) = socket.split();
    run_session(sink, stream, user_id, hub, fanout, config).await
}
