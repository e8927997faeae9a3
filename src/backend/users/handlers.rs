//! User HTTP Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::auth::users;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::messaging::PublicUser;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    /// Case-insensitive match on username, email, or phone
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<PublicUser>,
}

/// List every user except the caller (GET /api/v1/users?search=)
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ListUsersResponse>, BackendError> {
    let found = users::list_users(&state.db_pool, auth.user.id, params.search.as_deref()).await?;
    tracing::debug!("[Users] User {} listed {} users", auth.user.id, found.len());

    Ok(Json(ListUsersResponse {
        users: found.iter().map(users::User::to_public).collect(),
    }))
}
