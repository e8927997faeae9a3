//! Routes Module
//!
//! HTTP route configuration.
//!
//! - **`router`** - top-level router, health check, CORS and tracing layers
//! - **`api_routes`** - the `/api/v1` tree, split into public and protected

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
