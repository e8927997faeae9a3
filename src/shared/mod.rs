//! Shared Module
//!
//! Types shared between the wire protocol and the backend: the realtime
//! event set, inbound frame decoding, domain records, hub configuration, and
//! the shared error type. Everything here is plain data with serde
//! implementations and no I/O.

/// Inbound client frame decoding
pub mod message;

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Hub configuration
pub mod config;

/// Users, conversations, and messages
pub mod messaging;

/// Re-export commonly used types for convenience
pub use message::{ClientCommand, InboundFrame, MessagePayload};
pub use event::{PresenceStatus, RealtimeEvent};
pub use error::SharedError;
pub use config::{ConfigError, HubConfig, HubConfigBuilder};
