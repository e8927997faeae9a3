/**
 * Authentication Handler Types
 *
 * Request and response bodies for the register, login, logout, and
 * current-user handlers.
 */

use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::shared::messaging::PublicUser;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

/// Registration request
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RegisterRequest {
    /// 3-50 characters
    pub username: String,
    pub email: String,
    /// At least 6 characters; hashed before storage
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RegisterRequest {
    /// Check field lengths and email shape
    pub fn validate(&self) -> Result<(), BackendError> {
        let username_len = self.username.trim().chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
            return Err(BackendError::bad_request(format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN, USERNAME_MAX
            )));
        }
        if !is_valid_email(&self.email) {
            return Err(BackendError::bad_request("Invalid email address"));
        }
        if self.password.chars().count() < PASSWORD_MIN {
            return Err(BackendError::bad_request(format!(
                "Password must be at least {} characters",
                PASSWORD_MIN
            )));
        }
        Ok(())
    }
}

/// Basic shape check: one `@` with text on both sides
fn is_valid_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Login request
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register and login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Wrapper for a single user profile
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserResponse {
    pub user: PublicUser,
}

/// Plain acknowledgement
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}
