/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Open the database pool and apply migrations
 * 2. Start the hourly token blacklist cleanup
 * 3. Start the connection hub and its presence writer
 * 4. Build the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::auth::sessions::{spawn_token_cleanup, TokenConfig};
use crate::backend::error::BackendError;
use crate::backend::realtime::gateway::PgGateway;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails when the database is unreachable or migrations fail.
pub async fn create_app(config: &ServerConfig) -> Result<Router<()>, BackendError> {
    tracing::info!("[Init] Initializing chat backend");

    let db_pool = load_database(&config.database_url).await?;
    spawn_token_cleanup(db_pool.clone());

    let tokens = TokenConfig::new(config.jwt_secret.clone(), config.token_ttl);
    tracing::info!("[Init] Tokens valid for {:?}", tokens.ttl());
    let gateway = Arc::new(PgGateway::new(db_pool.clone()));
    let app_state = AppState::new(db_pool, tokens, config.hub.clone(), gateway);

    tracing::info!(
        "[Init] Hub ready (queue {}, heartbeat {:?}, read timeout {:?})",
        config.hub.outbound_capacity,
        config.hub.heartbeat_interval,
        config.hub.read_timeout
    );
    Ok(create_router(app_state))
}
