//! Real-time Fanout Module
//!
//! Accepts WebSocket connections from authenticated clients and pushes
//! server-generated events to exactly the live connections whose scopes
//! match.
//!
//! # Architecture
//!
//! - **`connection`** - One live connection: state, bounded outbound queue, drop accounting
//! - **`registry`** - Subjects to connections, scopes to connections
//! - **`broadcast`** - `FanoutRouter`, the entry point for pushing events
//! - **`pump`** - Outbound and inbound socket pumps
//! - **`protocol`** - Inbound client frames (typing, subscribe, unsubscribe)
//! - **`session`** - Lifecycle of one upgraded socket
//! - **`handshake`** - The `GET /ws` upgrade handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── connection.rs   - Connection and outbound queue
//! ├── registry.rs     - Connection registry
//! ├── broadcast.rs    - Fanout router
//! ├── pump.rs         - Socket pumps
//! ├── protocol.rs     - Inbound frame handling
//! ├── session.rs      - Session driver
//! └── handshake.rs    - Upgrade handler
//! ```
//!
//! # Backpressure
//!
//! Broadcasting never waits on a connection. Each connection has a bounded
//! queue; when it is full the event is dropped for that connection only, and a
//! connection that keeps dropping is closed. The client is expected to
//! reconnect.
//!
//! # Example
//!
//! ```rust,no_run
//! use huddle::backend::realtime::FanoutRouter;
//! use huddle::shared::{EventKind, OutboundEvent, Scope};
//!
//! # fn example(fanout: &FanoutRouter, dm_id: uuid::Uuid) -> Result<(), huddle::shared::SharedError> {
//! let event = OutboundEvent::json(
//!     EventKind::ReactionAdded,
//!     Scope::Dm(dm_id),
//!     &serde_json::json!({"message_id": "42", "emoji": ":tada:"}),
//! )?;
//! fanout.broadcast(&event);
//! # Ok(())
//! # }
//! ```

/// Connection and outbound queue
pub mod connection;

/// Connection registry
pub mod registry;

/// Fanout router
pub mod broadcast;

/// Socket pumps
pub mod pump;

/// Inbound frame handling
pub mod protocol;

/// Session driver
pub mod session;

/// WebSocket upgrade handler
pub mod handshake;

// Re-export commonly used types and functions
pub use broadcast::{BroadcastReport, FanoutRouter};
pub use connection::{Connection, ConnectionId, ConnectionState, EnqueueOutcome, OutboundQueue};
pub use handshake::ws_handler;
pub use registry::{Registry, RegistryStats};
