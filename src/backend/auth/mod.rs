//! Authentication Module
//!
//! Everything the gateway needs to know about who is connecting and what they
//! may listen to.
//!
//! # Architecture
//!
//! - **`sessions`** - JWT claims, signing keys, token creation and decoding
//! - **`verifier`** - `IdentityVerifier` capability and its JWT implementation
//! - **`membership`** - `MembershipProvider` with PostgreSQL and in-memory backends
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── sessions.rs     - JWT token management
//! ├── verifier.rs     - Handshake identity verification
//! └── membership.rs   - Scope authorization
//! ```
//!
//! # Security
//!
//! - Only `access` tokens are accepted at the handshake; refresh tokens are
//!   rejected as invalid credentials
//! - Tokens are verified once per connection; an open connection outlives
//!   revocation of the token that opened it
//! - Rejections never reveal the reason to the client

/// JWT token generation and validation
pub mod sessions;

/// Handshake identity verification
pub mod verifier;

/// Scope authorization
pub mod membership;

pub use membership::{InMemoryMembership, MembershipError, MembershipProvider, PgMembership};
pub use sessions::{create_token, verify_token, Claims, JwtKeys, TokenType};
pub use verifier::{IdentityVerifier, JwtVerifier, VerifyError};
