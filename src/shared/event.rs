/**
 * Real-time Event System
 *
 * This module defines the events the hub fans out to connected sessions.
 * The set is closed: presence changes, new messages, and typing indicators.
 *
 * # Wire Format
 *
 * Events serialize as JSON objects tagged by `type`:
 *
 * ```text
 * {"type":"status_change","user_id":4,"status":"online"}
 * {"type":"new_message","message":{...persisted record...}}
 * {"type":"typing","conversation_id":9,"user_id":4}
 * ```
 *
 * Presence and typing events are ephemeral. A `new_message` event is only
 * ever built from a record the store has already committed.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::messaging::{ConversationId, MessageRecord, UserId};

/// Presence state of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Offline,
}

impl PresenceStatus {
    /// Value stored in `users.status`
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered from the server to connected clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// A user came online or went offline
    StatusChange {
        user_id: UserId,
        status: PresenceStatus,
    },
    /// A message was committed to a conversation
    NewMessage { message: MessageRecord },
    /// A participant is typing
    Typing {
        conversation_id: ConversationId,
        user_id: UserId,
    },
}

impl RealtimeEvent {
    /// Create a presence event
    pub fn presence(user_id: UserId, status: PresenceStatus) -> Self {
        Self::StatusChange { user_id, status }
    }

    /// Create a new-message event from a persisted record
    pub fn new_message(message: MessageRecord) -> Self {
        Self::NewMessage { message }
    }

    /// Create a typing event
    pub fn typing(conversation_id: ConversationId, user_id: UserId) -> Self {
        Self::Typing {
            conversation_id,
            user_id,
        }
    }

    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            RealtimeEvent::StatusChange { .. } => "status_change",
            RealtimeEvent::NewMessage { .. } => "new_message",
            RealtimeEvent::Typing { .. } => "typing",
        }
    }
}
