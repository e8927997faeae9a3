/**
 * Login Handler
 *
 * POST /api/v1/auth/login
 *
 * # Security
 *
 * - Unknown email and wrong password both return 401 `Invalid credentials`
 * - Password verification goes through bcrypt on a blocking thread
 * - Password hashes are never returned in responses
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest};
use crate::backend::auth::users::get_user_by_email;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - If the user is not found or the password is wrong
/// * `500 Internal Server Error` - If the database or token creation fails
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let email = request.email.trim();
    tracing::info!("[Auth] Login request for: {}", email);

    let user = get_user_by_email(&state.db_pool, email)
        .await?
        .ok_or_else(|| {
            tracing::warn!("[Auth] User not found: {}", email);
            BackendError::unauthorized("Invalid credentials")
        })?;

    let password = request.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("[Auth] Verification task failed: {:?}", e);
            BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify password")
        })??;

    if !valid {
        tracing::warn!("[Auth] Invalid password for user: {}", user.username);
        return Err(BackendError::unauthorized("Invalid credentials"));
    }

    let token = state.tokens.create_token(user.id)?;
    tracing::info!("[Auth] User logged in: {} ({})", user.username, user.id);

    Ok(Json(AuthResponse {
        user: user.to_public(),
        token,
    }))
}
