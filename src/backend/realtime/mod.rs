//! Real-time Module
//!
//! WebSocket delivery of chat events: presence, new messages, and typing
//! indicators.
//!
//! # Architecture
//!
//! - **`hub`** - the single task that owns the set of live sessions and
//!   fans events out to their queues
//! - **`session`** - one per socket; receive and send loops with heartbeat
//!   and deadlines
//! - **`fanout`** - turns client commands into stored records and hub
//!   dispatches, and applies presence changes to the store
//! - **`gateway`** - the persistence queries the realtime path depends on
//! - **`handler`** - the authenticated upgrade endpoint
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs      - Module exports and documentation
//! ├── hub.rs      - Connection registry actor
//! ├── session.rs  - Per-connection loops
//! ├── fanout.rs   - Message and typing routing, presence writer
//! ├── gateway.rs  - ChatGateway trait, Postgres and in-memory impls
//! └── handler.rs  - GET /api/v1/ws
//! ```
//!
//! # Ordering
//!
//! Events reach a session's queue in the order the hub processed the
//! requests that produced them. A message is dispatched only after the
//! store has committed it.

pub mod fanout;
pub mod gateway;
pub mod handler;
pub mod hub;
pub mod session;

pub use fanout::FanoutRouter;
pub use gateway::{ChatGateway, GatewayError, MemoryGateway, PgGateway};
pub use handler::{serve_socket, ws_handler};
pub use hub::{Hub, HubHandle, HubSnapshot, SessionId};
pub use session::{run_session, SessionError, SessionReport, SessionState};
