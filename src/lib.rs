//! ChatHub - Main Library
//!
//! ChatHub is a realtime chat backend: REST endpoints for accounts,
//! conversations and message history, plus a WebSocket channel that delivers
//! new messages, typing indicators and presence changes as they happen.
//!
//! # Module Structure
//!
//! - **`shared`** - Types that cross the wire or the crate boundary
//!   - Users, conversations, messages, presence
//!   - Realtime events and inbound frames
//!   - Hub tuning configuration and shared errors
//!
//! - **`backend`** - The Axum server
//!   - Authentication (bcrypt, JWT, token revocation)
//!   - Conversation and user directory endpoints
//!   - The realtime hub, per-connection sessions and the fanout router
//!
//! # Usage
//!
//! ```rust,no_run
//! use chathub::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(&config).await?;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The set of live connections is owned by a single hub task; everything
//! else talks to it through a cloneable handle. Each connection's outbound
//! queue is bounded, and a connection that cannot keep up is disconnected
//! rather than allowed to stall the others.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
