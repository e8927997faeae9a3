/**
 * Session Management and JWT Tokens
 *
 * This module handles JWT token generation and validation for user sessions,
 * plus the revocation list that makes logout effective before a token
 * expires.
 *
 * # Revocation
 *
 * Logging out stores the token in `token_blacklist` together with its own
 * expiry. The auth middleware rejects any blacklisted token. Rows are only
 * useful until the token would have expired anyway, so a background task
 * deletes expired rows every hour.
 */

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;

use crate::shared::messaging::UserId;

/// How often expired blacklist rows are removed
pub const TOKEN_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: UserId,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Signing secret and token lifetime
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create an HS256 token for a user
    pub fn create_token(&self, user_id: UserId) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            exp: now + self.ttl.as_secs() as i64,
            iat: now,
        };

        let key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
    }

    /// Verify signature and expiry and decode the claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &key, &validation)?;
        Ok(token_data.claims)
    }
}

/// Add a token to the revocation list until it expires
pub async fn revoke_token(
    pool: &PgPool,
    token: &str,
    user_id: UserId,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO token_blacklist (token, user_id, expires_at, created_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (token) DO NOTHING
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    tracing::info!("[Auth] Revoked token for user {}", user_id);
    Ok(())
}

/// Check whether a token has been revoked
pub async fn is_token_revoked(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    let revoked: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE token = $1)
        "#,
    )
    .bind(token)
    .fetch_one(pool)
    .await?;

    Ok(revoked)
}

/// Delete revocation rows whose tokens have expired; returns the row count
pub async fn delete_expired_tokens(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM token_blacklist
        WHERE expires_at < NOW()
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Start the hourly blacklist cleanup task
pub fn spawn_token_cleanup(pool: PgPool) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TOKEN_CLEANUP_INTERVAL);
        // The first tick completes immediately; skip it so cleanup runs hourly.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match delete_expired_tokens(&pool).await {
                Ok(0) => {}
                Ok(count) => tracing::info!("[Auth] Cleaned up {} expired tokens", count),
                Err(e) => tracing::error!("[Auth] Error cleaning up expired tokens: {:?}", e),
            }
        }
    })
}
