/**
 * Inbound Frame Decoding
 *
 * Clients send JSON text frames of the form:
 *
 * ```text
 * {"type":"message","conversation_id":9,"content":"hi","message_type":"text","reply_to_id":3}
 * {"type":"typing","conversation_id":9}
 * ```
 *
 * Only JSON objects are accepted; arrays and scalars are rejected before
 * field decoding. Missing fields take their defaults, so an object only fails
 * to decode when a field has the wrong JSON type. Unknown `type` values decode
 * successfully and are ignored by the session.
 */
use serde::{Deserialize, Serialize};

use crate::shared::messaging::{ConversationId, MessageId, MessageType, NewMessage, UserId};
use crate::shared::SharedError;

/// Raw client frame as it arrives on the socket
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundFrame {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
}

/// Validated message payload, not yet bound to a sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePayload {
    pub conversation_id: ConversationId,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to_id: Option<MessageId>,
}

impl MessagePayload {
    /// Attach the sending user
    pub fn with_sender(self, sender_id: UserId) -> NewMessage {
        NewMessage {
            conversation_id: self.conversation_id,
            sender_id,
            content: self.content,
            message_type: self.message_type,
            reply_to_id: self.reply_to_id,
        }
    }
}

/// What a decoded frame asks the server to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    SendMessage(MessagePayload),
    Typing { conversation_id: ConversationId },
    /// Any other `type`; ignored
    Unknown(String),
}

impl InboundFrame {
    /// Decode a text frame
    ///
    /// The derived `Deserialize` would also fill the struct from a JSON array
    /// by position, so the object shape is checked first.
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(SharedError::validation("frame", "expected a JSON object"));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Validate the frame and turn it into a command
    pub fn into_command(self) -> Result<ClientCommand, SharedError> {
        match self.kind.as_str() {
            "message" => {
                check_conversation(self.conversation_id)?;
                if self.content.trim().is_empty() {
                    return Err(SharedError::validation("content", "message content is empty"));
                }
                let message_type = match self.message_type.as_deref() {
                    None | Some("") => MessageType::Text,
                    Some(raw) => raw.parse()?,
                };
                Ok(ClientCommand::SendMessage(MessagePayload {
                    conversation_id: self.conversation_id,
                    content: self.content,
                    message_type,
                    reply_to_id: self.reply_to_id,
                }))
            }
            "typing" => {
                check_conversation(self.conversation_id)?;
                Ok(ClientCommand::Typing {
                    conversation_id: self.conversation_id,
                })
            }
            _ => Ok(ClientCommand::Unknown(self.kind)),
        }
    }
}

fn check_conversation(conversation_id: ConversationId) -> Result<(), SharedError> {
    if conversation_id <= 0 {
        return Err(SharedError::validation(
            "conversation_id",
            "conversation_id must be a positive integer",
        ));
    }
    Ok(())
}
