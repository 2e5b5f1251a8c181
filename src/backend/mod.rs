//! Backend Module
//!
//! This module contains all server-side code of the Huddle real-time gateway.
//! It provides an Axum HTTP server that upgrades authenticated clients to
//! WebSockets and fans server-side events out to them.
//!
//! # Overview
//!
//! The backend module includes:
//! - Axum HTTP server setup and configuration
//! - The connection registry and per-connection pumps
//! - The fanout router used by the business layer to push events
//! - Presence tracking on connect and disconnect
//! - Credential verification and membership lookups
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Registry, connections, fanout and the upgrade handshake
//! - **`presence`** - Presence coordinator and presence stores
//! - **`auth`** - JWT tokens, identity verification, membership
//! - **`middleware`** - Credential extraction from upgrade requests
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Gateway binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── realtime/       - Registry, connections, fanout
//! ├── presence/       - Presence coordinator
//! ├── auth/           - Tokens and collaborators
//! ├── middleware/     - Credential extraction
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` holds one `Registry`, one `FanoutRouter` and one
//! `PresenceCoordinator`, each created once at startup and handed to every
//! collaborator that needs them. All of them are cheap to clone and share
//! their internals through `Arc`.
//!
//! # Thread Safety
//!
//! - The registry serializes all mutation behind a single mutex and never
//!   holds it while enqueuing to a connection
//! - Each connection's outbound queue is a bounded `tokio::sync::mpsc`
//!   channel with a single consumer
//! - The socket sink is owned exclusively by the outbound pump

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Real-time fanout gateway
#[cfg(feature = "ssr")]
pub mod realtime;

/// Presence tracking
#[cfg(feature = "ssr")]
pub mod presence;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Authentication and membership
#[cfg(feature = "ssr")]
pub mod auth;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use server::create_app;
#[cfg(feature = "ssr")]
pub use realtime::{BroadcastReport, Connection, EnqueueOutcome, FanoutRouter, Registry};
#[cfg(feature = "ssr")]
pub use presence::PresenceCoordinator;
#[cfg(feature = "ssr")]
pub use error::BackendError;
