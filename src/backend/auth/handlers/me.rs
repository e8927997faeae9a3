/**
 * Get Current User Handler
 *
 * GET /api/v1/users/me (protected)
 *
 * The auth middleware has already loaded the user row, so this handler
 * only strips it down to the public profile.
 */

use axum::response::Json;

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::middleware::AuthUser;

/// # Example Response
///
/// ```json
/// {
///   "user": {
///     "id": 4,
///     "username": "alice",
///     "email": "alice@example.com",
///     "status": "online",
///     "last_seen": "2024-05-01T10:00:00Z",
///     "created_at": "2024-04-01T10:00:00Z",
///     "updated_at": "2024-04-01T10:00:00Z"
///   }
/// }
/// ```
pub async fn get_me(AuthUser(auth): AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        user: auth.user.to_public(),
    })
}
