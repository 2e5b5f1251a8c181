//! Route Configuration Module
//!
//! This module configures all HTTP routes for the gateway server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs             - Module exports and documentation
//! ├── router.rs          - Main router creation
//! └── gateway_routes.rs  - Upgrade and health handlers
//! ```
//!
//! # Routes
//!
//! - `GET /ws` - WebSocket upgrade; `401` without a valid credential
//! - `GET /health` - `{"status":"ok","connections":N,"subjects":N,"scopes":N}`

/// Main router creation
pub mod router;

/// Gateway route handlers
pub mod gateway_routes;

// Re-export commonly used functions
pub use router::create_router;
