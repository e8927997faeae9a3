//! Backend Module
//!
//! All server-side code: the Axum router, its handlers, persistence, and the
//! realtime delivery system.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Route configuration and router assembly
//! - **`auth`** - Accounts, passwords, JWT issue/verify, token revocation
//! - **`middleware`** - Bearer/query token authentication
//! - **`users`** - User directory
//! - **`conversations`** - Conversations and message history
//! - **`realtime`** - Hub, sessions, fanout and the WebSocket endpoint
//! - **`error`** - `BackendError` and its HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Config, state, init
//! ├── routes/         - Route configuration
//! ├── auth/           - Authentication
//! ├── middleware/     - Request middleware
//! ├── users/          - User directory
//! ├── conversations/  - Conversations and history
//! ├── realtime/       - WebSocket delivery
//! └── error/          - Error types
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time delivery
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication and user management
pub mod auth;

/// Middleware for request processing
pub mod middleware;

/// User directory
pub mod users;

/// Conversations and message history
pub mod conversations;

pub use error::BackendError;
pub use server::create_app;
