//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - A gateway served on an ephemeral port with in-memory collaborators
//! - Token minting for test subjects
//! - WebSocket client helpers

pub mod auth_helpers;
pub mod gateway;
pub mod ws_client;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use gateway::*;
pub use ws_client::*;
