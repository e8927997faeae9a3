/**
 * Application State Management
 *
 * `AppState` is the central state container handed to every Axum handler.
 * It is cheap to clone: the pool, hub handle, and router are all handles to
 * shared resources.
 *
 * # Contents
 *
 * - `db_pool` - PostgreSQL pool for the CRUD handlers and the auth middleware
 * - `tokens` - JWT signing secret and lifetime
 * - `hub` - handle to the connection hub task
 * - `fanout` - router that persists and dispatches realtime traffic
 * - `hub_config` - per-session limits and timings
 *
 * The `FromRef` implementations let handlers extract just the pool or the
 * hub handle with `State<PgPool>` / `State<HubHandle>`.
 */

use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

use crate::backend::auth::sessions::TokenConfig;
use crate::backend::realtime::fanout::{spawn_presence_writer, FanoutRouter};
use crate::backend::realtime::gateway::ChatGateway;
use crate::backend::realtime::hub::{Hub, HubHandle};
use crate::shared::HubConfig;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub tokens: TokenConfig,
    pub hub: HubHandle,
    pub fanout: FanoutRouter,
    pub hub_config: HubConfig,
}

impl AppState {
    /// Start the hub and its presence writer and assemble the state
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        db_pool: PgPool,
        tokens: TokenConfig,
        hub_config: HubConfig,
        gateway: Arc<dyn ChatGateway>,
    ) -> Self {
        let presence = spawn_presence_writer(gateway.clone());
        let hub = Hub::spawn(Some(presence));
        let fanout = FanoutRouter::new(gateway, hub.clone());
        Self {
            db_pool,
            tokens,
            hub,
            fanout,
            hub_config,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for HubHandle {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}
