//! Authentication test helpers

use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use chathub::backend::auth::sessions::TokenConfig;
use chathub::backend::auth::users::create_user;
use chathub::backend::auth::User;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests";
pub const TEST_PASSWORD: &str = "test_password_123";

/// A stored user and a valid token for it
pub struct TestUser {
    pub user: User,
    pub password: String,
    pub token: String,
}

/// Token configuration shared by the test router and the helpers
pub fn test_tokens() -> TokenConfig {
    TokenConfig::new(TEST_SECRET.to_string(), Duration::from_secs(3600))
}

/// Create a user with a unique username and email
pub async fn create_unique_test_user(pool: &PgPool) -> Result<TestUser, Box<dyn std::error::Error>> {
    let tag = Uuid::new_v4().simple().to_string();
    let username = format!("user_{}", &tag[..12]);
    let email = format!("{}@example.com", username);

    let password_hash = bcrypt::hash(TEST_PASSWORD, bcrypt::DEFAULT_COST)?;
    let user = create_user(pool, &username, &email, &password_hash, None).await?;
    let token = test_tokens().create_token(user.id)?;

    Ok(TestUser {
        user,
        password: TEST_PASSWORD.to_string(),
        token,
    })
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}
