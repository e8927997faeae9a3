//! Client input errors
//!
//! Everything a client sends over the socket is decoded and validated in
//! `shared`; a failure is one of two kinds:
//!
//! - `SerializationError` - the text was not JSON, or a field had the wrong JSON type
//! - `ValidationError` - the JSON decoded but a field's value is unacceptable
//!
//! ```rust
//! use chathub::shared::error::SharedError;
//! use chathub::shared::InboundFrame;
//!
//! let error = InboundFrame::parse("[1, 2]").unwrap_err();
//! assert!(matches!(error, SharedError::ValidationError { .. }));
//! ```
use thiserror::Error;

/// Why a client frame or field was refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    /// `field` names the offending input, e.g. `conversation_id` or `frame`
    #[error("Validation error in field '{field}': {message}")]
    ValidationError { field: String, message: String },
}

impl SharedError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
