/**
 * Register Handler
 *
 * POST /api/v1/auth/register
 *
 * # Registration Process
 *
 * 1. Validate username, email, and password
 * 2. Reject with 409 if the username or email is taken
 * 3. Hash the password with bcrypt
 * 4. Create the user (status `offline`)
 * 5. Return the public profile and a fresh token
 */

use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::DEFAULT_COST;

use crate::backend::auth::handlers::types::{AuthResponse, RegisterRequest};
use crate::backend::auth::users::{create_user, user_exists};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Register handler
///
/// # Errors
///
/// * `400 Bad Request` - If a field fails validation
/// * `409 Conflict` - If the username or email already exists
/// * `500 Internal Server Error` - If hashing, the database, or token creation fails
///
/// # Example Request
///
/// ```http
/// POST /api/v1/auth/register HTTP/1.1
/// Content-Type: application/json
///
/// {"username":"alice","email":"alice@example.com","password":"secret1"}
/// ```
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), BackendError> {
    request.validate()?;
    let username = request.username.trim();
    let email = request.email.trim();
    tracing::info!("[Auth] Register request for: {}", username);

    if user_exists(&state.db_pool, username, email).await? {
        tracing::warn!("[Auth] Username or email already taken: {}", username);
        return Err(BackendError::conflict("User already exists"));
    }

    let password_hash = hash_password(request.password.clone()).await?;
    let phone = request
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty());
    let user = create_user(&state.db_pool, username, email, &password_hash, phone).await?;
    let token = state.tokens.create_token(user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.to_public(),
            token,
        }),
    ))
}

/// Hash off the async workers; bcrypt is deliberately slow
pub(crate) async fn hash_password(password: String) -> Result<String, BackendError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, DEFAULT_COST))
        .await
        .map_err(|e| {
            tracing::error!("[Auth] Hashing task failed: {:?}", e);
            BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password")
        })?
        .map_err(BackendError::from)
}
