/**
 * User Model and Database Operations
 *
 * This module handles user rows and the queries the auth, user, and
 * realtime layers run against them.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::shared::messaging::{PublicUser, UserId};
use crate::shared::PresenceStatus;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, phone, avatar, status, last_seen, created_at, updated_at";

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Database-assigned user ID
    pub id: UserId,
    /// Username (unique, 3-50 chars)
    pub username: String,
    /// User email address (unique)
    pub email: String,
    /// Hashed password (bcrypt)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    /// Last persisted presence
    pub status: String,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Profile safe to return to clients
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            avatar: self.avatar.clone(),
            status: self.status.clone(),
            last_seen: self.last_seen,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Create a new user
///
/// New users start `offline`; the hub flips them online when they connect.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    phone: Option<&str>,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash, phone, status, last_seen, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'offline', $5, $5, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(phone)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::info!("[Auth] Created user {} ({})", user.id, user.username);
    Ok(user)
}

/// Check whether a username or email is already taken
pub async fn user_exists(pool: &PgPool, username: &str, email: &str) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)
        "#,
    )
    .bind(email)
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Get user by email
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE email = $1
        "#
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Get user by ID
pub async fn get_user_by_id(pool: &PgPool, id: UserId) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// List every user except `exclude`
///
/// With a search term, only users whose username, email, or phone contains
/// it (case-insensitive) are returned.
pub async fn list_users(
    pool: &PgPool,
    exclude: UserId,
    search: Option<&str>,
) -> Result<Vec<User>, sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{}%", term));

    let users = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE id <> $1
          AND ($2::TEXT IS NULL
               OR username ILIKE $2
               OR email ILIKE $2
               OR phone ILIKE $2)
        ORDER BY username
        "#
    ))
    .bind(exclude)
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Persist a user's presence and last-seen time
pub async fn set_user_presence(
    pool: &PgPool,
    user_id: UserId,
    status: PresenceStatus,
    last_seen: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET status = $1, last_seen = $2
        WHERE id = $3
        "#,
    )
    .bind(status.as_str())
    .bind(last_seen)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}
