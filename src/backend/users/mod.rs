//! Users Module
//!
//! Directory lookups for finding people to talk to. Account creation and
//! the current-user profile live in `backend::auth`.

pub mod handlers;

pub use handlers::list_users;
