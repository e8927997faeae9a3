//! Integration tests
//!
//! - `realtime_test` - sessions over real sockets against an in-process hub
//! - `api_test` - routing, authentication rejections, health
//! - `database_test` - Postgres-backed flows (ignored without a database)

mod api_test;
mod realtime_test;
