//! Messaging Module
//!
//! Domain records for the chat system:
//!
//! - `PublicUser` / `UserSummary` - user profiles safe to send to clients
//! - `Conversation` - a direct or group conversation with participants
//! - `MessageRecord` - a persisted message
//!
//! Identifiers are database-assigned integers.

pub mod conversation;
pub mod message;
pub mod user;

/// Database identifier of a user
pub type UserId = i64;

/// Database identifier of a conversation
pub type ConversationId = i64;

/// Database identifier of a message
pub type MessageId = i64;

pub use conversation::{
    Conversation, ConversationResponse, ConversationType, CreateConversationRequest,
    ListConversationsResponse, ListMessagesResponse,
};
pub use message::{MessageRecord, MessageStatus, MessageType, NewMessage};
pub use user::{PublicUser, UserSummary};
