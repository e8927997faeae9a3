//! Test suite for ChatHub
//!
//! - `common` - fixtures: in-process chat server, database, tokens, assertions
//! - `integration` - WebSocket sessions end to end, HTTP routing, database flows
//! - `property` - proptest checks over the hub and frame decoding

pub mod common;
pub mod integration;
pub mod property;
