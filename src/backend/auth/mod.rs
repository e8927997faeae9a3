//! Authentication Module
//!
//! User accounts, JWT sessions, and the HTTP handlers that issue and revoke
//! tokens.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - JWT tokens and the revocation list
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: username, email, password → user created → token returned
//! 2. **Login**: email and password verified → token returned
//! 3. **Protected requests**: token checked by `middleware::auth`
//! 4. **Logout**: token added to the revocation list until it expires
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens are HS256 JWTs carrying `user_id`, `exp`, and `iat`
//! - Invalid credentials return 401 (no information leakage)

/// User data model and database operations
pub mod users;

/// JWT token generation, validation, and revocation
pub mod sessions;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::{get_me, login, logout, register};
pub use sessions::{Claims, TokenConfig};
pub use users::User;
