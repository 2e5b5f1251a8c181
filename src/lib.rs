//! Huddle - Real-time Gateway Library
//!
//! Huddle is the real-time layer of a team-chat backend. It accepts persistent
//! WebSocket connections from authenticated clients, tracks which scopes
//! (workspace, channel, direct-message session, user) each connection cares
//! about, and pushes server-generated events to exactly the live connections
//! that should see them.
//!
//! # Module Structure
//!
//! - **`shared`** - Transport-agnostic types
//!   - Outbound events, scopes and the wire envelope
//!   - Inbound client frames
//!   - Gateway configuration and shared error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum server with the WebSocket upgrade endpoint
//!   - Connection registry, per-connection pumps and fanout router
//!   - Presence coordination
//!   - Identity verification and membership collaborators
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the `backend` module and the server binary
//!
//! # Delivery Model
//!
//! Delivery is best-effort and in-memory: a connection that is not live when
//! an event is broadcast never sees it, and a connection whose bounded queue is
//! full has the event dropped instead of stalling the broadcaster. Durable
//! history belongs to the persistence layer.
//!
//! # Usage
//!
//! ```rust,no_run
//! use huddle::backend::server::init::create_app;
//! use huddle::backend::server::config::load_settings;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = load_settings()?;
//! let (app, state) = create_app(settings).await;
//! // Serve `app` with axum; push events through `state.fanout`
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
