/**
 * Persistence Gateway
 *
 * The fanout router never talks to the database directly. It goes through
 * `ChatGateway`, which exposes exactly the three queries the realtime path
 * needs:
 *
 * - `create_message` - commit a message (only for conversation participants)
 * - `conversation_participants` - authoritative membership, never cached
 * - `set_user_presence` - persist status and last-seen
 *
 * `PgGateway` is the production implementation. `MemoryGateway` keeps the
 * same contract in process and can be told to fail, which is how the
 * write-then-notify ordering is exercised in tests.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::backend::auth::users::set_user_presence;
use crate::backend::conversations::db;
use crate::shared::messaging::{
    ConversationId, MessageRecord, MessageStatus, NewMessage, UserId,
};
use crate::shared::PresenceStatus;

/// Failures reported by a persistence gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Sender does not belong to the conversation
    #[error("user {user_id} is not a participant of conversation {conversation_id}")]
    NotParticipant {
        user_id: UserId,
        conversation_id: ConversationId,
    },

    /// Store refused the operation for another reason
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Query surface consumed by the fanout router and the hub's presence writer
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Commit a message and return the stored record
    ///
    /// Returns only after the row is durable, so callers may notify
    /// recipients as soon as this resolves.
    async fn create_message(&self, message: NewMessage) -> Result<MessageRecord, GatewayError>;

    /// Current members of a conversation
    async fn conversation_participants(
        &self,
        conversation_id: ConversationId,
    ) -> Result<HashSet<UserId>, GatewayError>;

    /// Persist a user's presence flag and last-seen time
    async fn set_user_presence(
        &self,
        user_id: UserId,
        status: PresenceStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), GatewayError>;
}

/// PostgreSQL-backed gateway
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatGateway for PgGateway {
    async fn create_message(&self, message: NewMessage) -> Result<MessageRecord, GatewayError> {
        db::create_message(&self.pool, &message)
            .await?
            .ok_or(GatewayError::NotParticipant {
                user_id: message.sender_id,
                conversation_id: message.conversation_id,
            })
    }

    async fn conversation_participants(
        &self,
        conversation_id: ConversationId,
    ) -> Result<HashSet<UserId>, GatewayError> {
        Ok(db::participant_ids(&self.pool, conversation_id).await?)
    }

    async fn set_user_presence(
        &self,
        user_id: UserId,
        status: PresenceStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        set_user_presence(&self.pool, user_id, status, last_seen).await?;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryState {
    participants: HashMap<ConversationId, HashSet<UserId>>,
    messages: Vec<MessageRecord>,
    presence: Vec<(UserId, PresenceStatus)>,
    next_message_id: i64,
}

/// In-process gateway for tests and local experiments
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    fail_messages: AtomicBool,
    fail_participants: AtomicBool,
    fail_presence: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversation and its members
    pub fn add_conversation(
        &self,
        conversation_id: ConversationId,
        members: impl IntoIterator<Item = UserId>,
    ) {
        self.lock()
            .participants
            .insert(conversation_id, members.into_iter().collect());
    }

    /// Make every subsequent `create_message` fail
    pub fn fail_message_writes(&self, fail: bool) {
        self.fail_messages.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent participant lookup fail
    pub fn fail_participant_lookups(&self, fail: bool) {
        self.fail_participants.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent presence write fail
    pub fn fail_presence_writes(&self, fail: bool) {
        self.fail_presence.store(fail, Ordering::SeqCst);
    }

    /// Messages committed so far
    pub fn messages(&self) -> Vec<MessageRecord> {
        self.lock().messages.clone()
    }

    /// Presence writes applied so far, in order
    pub fn presence_log(&self) -> Vec<(UserId, PresenceStatus)> {
        self.lock().presence.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChatGateway for MemoryGateway {
    async fn create_message(&self, message: NewMessage) -> Result<MessageRecord, GatewayError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("message writes disabled".to_string()));
        }

        let mut state = self.lock();
        let is_member = state
            .participants
            .get(&message.conversation_id)
            .is_some_and(|members| members.contains(&message.sender_id));
        if !is_member {
            return Err(GatewayError::NotParticipant {
                user_id: message.sender_id,
                conversation_id: message.conversation_id,
            });
        }

        state.next_message_id += 1;
        let now = Utc::now();
        let record = MessageRecord {
            id: state.next_message_id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender: None,
            content: message.content,
            message_type: message.message_type,
            status: MessageStatus::Sent,
            media_url: None,
            reply_to_id: message.reply_to_id,
            created_at: now,
            updated_at: now,
        };
        state.messages.push(record.clone());
        Ok(record)
    }

    async fn conversation_participants(
        &self,
        conversation_id: ConversationId,
    ) -> Result<HashSet<UserId>, GatewayError> {
        if self.fail_participants.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("participant lookups disabled".to_string()));
        }
        Ok(self
            .lock()
            .participants
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_user_presence(
        &self,
        user_id: UserId,
        status: PresenceStatus,
        _last_seen: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        if self.fail_presence.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("presence writes disabled".to_string()));
        }
        self.lock().presence.push((user_id, status));
        Ok(())
    }
}
