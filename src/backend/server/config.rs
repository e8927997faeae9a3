/**
 * Server Configuration
 *
 * This module loads server configuration from environment variables and
 * opens the PostgreSQL pool.
 *
 * # Variables
 *
 * - `SERVER_PORT` - listen port (default 8080)
 * - `DATABASE_URL` - full connection string; when unset it is assembled from
 *   `DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_PORT`
 * - `JWT_SECRET` - token signing secret (a development default is used,
 *   with a warning, when unset)
 * - `TOKEN_TTL_HOURS` - token lifetime (default 168)
 * - `HUB_OUTBOUND_CAPACITY`, `HUB_HEARTBEAT_SECS`, `HUB_READ_TIMEOUT_SECS`,
 *   `HUB_WRITE_TIMEOUT_SECS` - hub overrides
 */

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

use crate::backend::error::BackendError;
use crate::shared::{ConfigError, HubConfig};

const DEV_JWT_SECRET: &str = "your-secret-key-change-in-production";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_HOURS: u64 = 7 * 24;

/// Everything the server needs to start
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub hub: HubConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("token_ttl", &self.token_ttl)
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = parse_or(&var, "SERVER_PORT", DEFAULT_PORT)?;

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let user = var("DB_USER").unwrap_or_else(|| "postgres".to_string());
                let password = var("DB_PASSWORD").unwrap_or_else(|| "postgres".to_string());
                let name = var("DB_NAME").unwrap_or_else(|| "chatapp".to_string());
                let db_port: u16 = parse_or(&var, "DB_PORT", 5432)?;
                format!("postgres://{user}:{password}@{host}:{db_port}/{name}")
            }
        };

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("[Config] JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });

        let ttl_hours: u64 = parse_or(&var, "TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "TOKEN_TTL_HOURS",
                reason: "must be at least one hour".to_string(),
            });
        }

        let defaults = HubConfig::default();
        let hub = HubConfig::builder()
            .outbound_capacity(parse_or(
                &var,
                "HUB_OUTBOUND_CAPACITY",
                defaults.outbound_capacity,
            )?)
            .heartbeat_interval(Duration::from_secs(parse_or(
                &var,
                "HUB_HEARTBEAT_SECS",
                defaults.heartbeat_interval.as_secs(),
            )?))
            .read_timeout(Duration::from_secs(parse_or(
                &var,
                "HUB_READ_TIMEOUT_SECS",
                defaults.read_timeout.as_secs(),
            )?))
            .write_timeout(Duration::from_secs(parse_or(
                &var,
                "HUB_WRITE_TIMEOUT_SECS",
                defaults.write_timeout.as_secs(),
            )?))
            .build()?;

        Ok(Self {
            port,
            database_url,
            jwt_secret,
            token_ttl: Duration::from_secs(ttl_hours * 60 * 60),
            hub,
        })
    }
}

fn parse_or<T, V>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Unparseable {
            field: key,
            value: raw,
        }),
    }
}

/// Connect to PostgreSQL and apply pending migrations
///
/// # Errors
///
/// Fails if the connection cannot be established or a migration fails;
/// the server cannot run without its schema.
pub async fn load_database(database_url: &str) -> Result<PgPool, BackendError> {
    tracing::info!("[Config] Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    tracing::info!("[Config] Database connection pool created");

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("[Config] Database migrations completed");

    Ok(pool)
}
