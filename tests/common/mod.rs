//! Common test utilities and helpers
//!
//! - Database test fixtures
//! - In-process chat server and WebSocket client
//! - Authentication test helpers
//! - Custom assertion macros

pub mod assertions;
pub mod auth_helpers;
pub mod database;
pub mod mock_server;

pub use auth_helpers::*;
pub use database::*;
pub use mock_server::*;
