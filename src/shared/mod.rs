//! Shared Module
//!
//! This module contains types that do not depend on the server runtime:
//! the outbound event model and its wire envelope, the frames clients may
//! send, gateway configuration and the shared error type.
//!
//! Everything here is plain data and can be used from tests, tools or other
//! services that need to produce events for the gateway.

/// Outbound events, scopes and the wire envelope
pub mod event;

/// Inbound client frames
pub mod frame;

/// Shared error types
pub mod error;

/// Gateway configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use event::{EventKind, OutboundEvent, PresencePayload, Scope, ScopeKind, SubjectId, TypingPayload};
pub use frame::ClientFrame;
pub use error::SharedError;
pub use config::{ConfigError, GatewayConfig, GatewayConfigBuilder};
