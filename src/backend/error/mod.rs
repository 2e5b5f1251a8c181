//! Backend Error Module
//!
//! This module defines the error type returned by HTTP handlers and its
//! conversion into responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! Errors that belong to a single connection (transport failures, full
//! queues) are not represented here; they are handled where they occur and
//! only ever affect that connection.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
