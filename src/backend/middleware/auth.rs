/**
 * Authentication Middleware
 *
 * Protects routes that require a logged-in user. The token is taken from
 * the `Authorization: Bearer <token>` header, or from a `token` query
 * parameter when no header is present (browsers cannot set headers on a
 * WebSocket upgrade).
 *
 * A request passes when the token verifies, has not been revoked, and names
 * a user that still exists. The loaded user and the raw token are attached
 * to the request extensions for handlers to pick up through `AuthUser`.
 */

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::backend::auth::sessions::is_token_revoked;
use crate::backend::auth::users::{get_user_by_id, User};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Authenticated user attached by the middleware
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    /// The token the request was authenticated with
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Find the bearer token in the header or the query string
pub fn extract_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if from_header.is_some() {
        return from_header;
    }

    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Returns 401 if the token is missing, invalid, expired, revoked, or names
/// a user that no longer exists.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = extract_token(&request).ok_or_else(|| {
        tracing::warn!("[Auth] Missing token on {}", request.uri().path());
        BackendError::unauthorized("Authorization token required")
    })?;

    let claims = app_state.tokens.verify_token(&token).map_err(|e| {
        tracing::warn!("[Auth] Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    if is_token_revoked(&app_state.db_pool, &token).await? {
        tracing::warn!("[Auth] Revoked token used by user {}", claims.user_id);
        return Err(BackendError::unauthorized("Token has been revoked"));
    }

    let user = get_user_by_id(&app_state.db_pool, claims.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("[Auth] Token names unknown user {}", claims.user_id);
            BackendError::unauthorized("User not found")
        })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user, token });

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
///
/// Only valid on routes behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Unauthorized")
            })?;

        Ok(AuthUser(user))
    }
}
