//! Conversation HTTP Handlers
//!
//! - `POST /api/v1/conversations` - create (or reuse a direct) conversation
//! - `GET /api/v1/conversations` - the caller's conversations
//! - `GET /api/v1/conversations/{id}/messages` - history, participants only

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::db;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{
    ConversationId, ConversationResponse, ConversationType, CreateConversationRequest,
    ListConversationsResponse, ListMessagesResponse,
};

/// Create a conversation
///
/// For a direct conversation that already exists between the two users the
/// existing one is returned with 200 instead of creating a duplicate.
/// Otherwise the new conversation is returned with 201.
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationResponse>), BackendError> {
    let pool = &state.db_pool;
    let creator = auth.user.id;
    request.validate(creator)?;

    let members: Vec<_> = match request.conversation_type {
        ConversationType::Direct => {
            let other = request
                .participant_id
                .ok_or_else(|| BackendError::bad_request("participant_id is required"))?;
            if let Some(existing) = db::find_direct_conversation(pool, creator, other).await? {
                tracing::debug!(
                    "[Conversations] Reusing direct conversation {} for users {} and {}",
                    existing,
                    creator,
                    other
                );
                let conversation = db::get_conversation(pool, existing)
                    .await?
                    .ok_or_else(|| BackendError::not_found("Conversation not found"))?;
                return Ok((StatusCode::OK, Json(ConversationResponse { conversation })));
            }
            vec![other]
        }
        ConversationType::Group => request.participant_ids.clone(),
    };

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let conversation_id =
        db::create_conversation(pool, creator, request.conversation_type, name, &members).await?;
    let conversation = db::get_conversation(pool, conversation_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Conversation not found"))?;

    Ok((StatusCode::CREATED, Json(ConversationResponse { conversation })))
}

/// List the caller's conversations, most recently active first
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<ListConversationsResponse>, BackendError> {
    let conversations = db::list_conversations_for_user(&state.db_pool, auth.user.id).await?;
    Ok(Json(ListConversationsResponse { conversations }))
}

/// Message history of a conversation, oldest first
///
/// Returns 403 `Access denied` unless the caller is a participant.
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<ListMessagesResponse>, BackendError> {
    if !db::is_participant(&state.db_pool, conversation_id, auth.user.id).await? {
        tracing::warn!(
            "[Conversations] User {} denied access to conversation {}",
            auth.user.id,
            conversation_id
        );
        return Err(BackendError::forbidden("Access denied"));
    }

    let messages = db::list_messages(&state.db_pool, conversation_id).await?;
    Ok(Json(ListMessagesResponse { messages }))
}
