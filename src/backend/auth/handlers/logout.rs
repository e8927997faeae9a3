/**
 * Logout Handler
 *
 * POST /api/v1/auth/logout (protected)
 *
 * Adds the presented token to the revocation list until it would have
 * expired. Presence is not touched here; the user goes offline when their
 * WebSocket session ends.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::MessageResponse;
use crate::backend::auth::sessions::revoke_token;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

pub async fn logout(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<MessageResponse>, BackendError> {
    let claims = state.tokens.verify_token(&auth.token)?;
    revoke_token(&state.db_pool, &auth.token, auth.user.id, claims.expires_at()).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}
