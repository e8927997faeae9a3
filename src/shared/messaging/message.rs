//! Chat Message Records
//!
//! A message as persisted by the store and as delivered inside a
//! `new_message` event. Records are produced only by the persistence layer,
//! so every `MessageRecord` a client sees corresponds to a committed row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::UserSummary;
use super::{ConversationId, MessageId, UserId};
use crate::shared::SharedError;

/// Kind of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Plain text message
    #[default]
    Text,
    /// Image message
    Image,
    /// Video message
    Video,
    /// Audio message
    Audio,
    /// File attachment
    File,
}

impl MessageType {
    /// Column value used by the `messages.type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::File => "file",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "video" => Ok(MessageType::Video),
            "audio" => Ok(MessageType::Audio),
            "file" => Ok(MessageType::File),
            other => Err(SharedError::validation(
                "message_type",
                format!("unknown message type '{}'", other),
            )),
        }
    }
}

/// Delivery status of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
        }
    }
}

impl FromStr for MessageStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(MessageStatus::Sent),
            "delivered" => Ok(MessageStatus::Delivered),
            "read" => Ok(MessageStatus::Read),
            other => Err(SharedError::validation(
                "status",
                format!("unknown message status '{}'", other),
            )),
        }
    }
}

/// A persisted chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    /// Database-assigned message ID
    pub id: MessageId,
    /// Conversation this message belongs to
    pub conversation_id: ConversationId,
    /// User who sent the message
    pub sender_id: UserId,
    /// Sender profile, loaded alongside the row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserSummary>,
    /// Message body
    pub content: String,
    /// Kind of content
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Delivery status
    pub status: MessageStatus,
    /// Attached media location, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Message this one replies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
    /// Commit timestamp
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated message ready to be written by the persistence layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to_id: Option<MessageId>,
}
