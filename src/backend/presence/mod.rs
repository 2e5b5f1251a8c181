//! Presence Module
//!
//! Online/offline tracking driven by connection lifecycle.
//!
//! - **`store`** - `PresenceStore` with PostgreSQL and in-memory backends
//! - **`coordinator`** - Writes presence and announces it through the fanout router
//!
//! A subject goes online when its first connection registers and offline only
//! when its last connection has been unregistered.

/// Presence persistence
pub mod store;

/// Presence coordinator
pub mod coordinator;

pub use coordinator::PresenceCoordinator;
pub use store::{InMemoryPresenceStore, PgPresenceStore, PresenceError, PresenceStatus, PresenceStore};
