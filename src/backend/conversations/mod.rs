//! Conversations Module
//!
//! Direct and group conversations, their membership, and message history.
//! Live delivery of new messages happens over the WebSocket in
//! `backend::realtime`; this module only serves the stored state.

pub mod db;
pub mod handlers;

pub use handlers::{create_conversation, list_conversations, list_messages};
