//! Identity verification for the WebSocket handshake.
//!
//! The gateway consumes a single capability: turn a bearer credential into a
//! subject id or fail. The credential is checked once, when the connection is
//! established, and not again for the life of the connection.

use crate::backend::auth::sessions::{verify_token, JwtKeys, TokenType};
use crate::shared::SubjectId;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;
use uuid::Uuid;

/// Why a credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("invalid credential")]
    InvalidCredential,
    #[error("credential expired")]
    Expired,
}

/// Verify a bearer credential and return the subject it identifies
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<SubjectId, VerifyError>;
}

/// HS256 JWT verifier accepting access tokens only
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    keys: JwtKeys,
}

impl JwtVerifier {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }

    pub fn from_secret(secret: &str) -> Self {
        Self::new(JwtKeys::from_secret(secret.as_bytes()))
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<SubjectId, VerifyError> {
        let claims = verify_token(&self.keys, credential).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            _ => VerifyError::InvalidCredential,
        })?;

        if claims.token_type != TokenType::Access {
            return Err(VerifyError::InvalidCredential);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| VerifyError::InvalidCredential)
    }
}
