//! Conversation Data Structures
//!
//! Request and response types for the conversation endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::message::MessageRecord;
use super::user::UserSummary;
use super::{ConversationId, UserId};
use crate::shared::SharedError;

/// Direct (two-party) or group conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    Direct,
    Group,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Direct => "direct",
            ConversationType::Group => "group",
        }
    }
}

impl fmt::Display for ConversationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(ConversationType::Direct),
            "group" => Ok(ConversationType::Group),
            other => Err(SharedError::validation(
                "type",
                format!("type must be 'direct' or 'group', got '{}'", other),
            )),
        }
    }
}

/// A conversation with its participants and, when listed, its latest message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(rename = "type")]
    pub conversation_type: ConversationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_by: UserId,
    pub participants: Vec<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a conversation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateConversationRequest {
    #[serde(rename = "type")]
    pub conversation_type: ConversationType,
    #[serde(default)]
    pub name: Option<String>,
    /// Other party of a direct conversation
    #[serde(default)]
    pub participant_id: Option<UserId>,
    /// Members of a group conversation (the creator is always added)
    #[serde(default)]
    pub participant_ids: Vec<UserId>,
}

impl CreateConversationRequest {
    /// Check the request shape for the given creator
    pub fn validate(&self, creator: UserId) -> Result<(), SharedError> {
        match self.conversation_type {
            ConversationType::Direct => match self.participant_id {
                None => Err(SharedError::validation(
                    "participant_id",
                    "direct conversations need a participant_id",
                )),
                Some(other) if other == creator => Err(SharedError::validation(
                    "participant_id",
                    "cannot open a direct conversation with yourself",
                )),
                Some(_) => Ok(()),
            },
            ConversationType::Group => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation: Conversation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageRecord>,
}
