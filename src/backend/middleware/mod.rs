//! Middleware Module
//!
//! Request processing that runs before a handler.
//!
//! - **`auth`** - Credential extraction and verification for the upgrade endpoint
//!
//! # Example
//!
//! ```rust,no_run
//! use huddle::backend::middleware::AuthSubject;
//!
//! // Listing `AuthSubject` first makes the handler reject with 401 before the
//! // upgrade is negotiated:
//! // async fn ws_handler(AuthSubject(subject): AuthSubject, ws: WebSocketUpgrade) { ... }
//! ```

pub mod auth;

pub use auth::{extract_credential, AuthSubject, CredentialSource};
