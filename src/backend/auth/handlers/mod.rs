//! Authentication Handlers Module
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs       - Module exports and documentation
//! ├── types.rs     - Request and response types
//! ├── register.rs  - User registration handler
//! ├── login.rs     - User authentication handler
//! ├── logout.rs    - Token revocation handler
//! └── me.rs        - Current user handler
//! ```
//!
//! # Handlers
//!
//! - **`register`** - POST /api/v1/auth/register
//! - **`login`** - POST /api/v1/auth/login
//! - **`logout`** - POST /api/v1/auth/logout (protected)
//! - **`get_me`** - GET /api/v1/users/me (protected)

/// Request and response types
pub mod types;

/// Registration handler
pub mod register;

/// Login handler
pub mod login;

/// Logout handler
pub mod logout;

/// Current user handler
pub mod me;

pub use types::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse};

pub use login::login;
pub use logout::logout;
pub use me::get_me;
pub use register::register;
