/**
 * Session Tokens
 *
 * JWT encoding and decoding for the credentials presented at the WebSocket
 * handshake. The gateway only verifies tokens; `create_token` exists for the
 * login flow of the wider system and for tests.
 */

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Secret used when `JWT_SECRET` is not set; development only
pub const DEV_JWT_SECRET: &str = "huddle-dev-secret-change-in-production";

/// Kind of session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    #[serde(default)]
    pub email: String,
    /// Access or refresh
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// HMAC keys derived from the shared secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `keys` - Signing keys
/// * `user_id` - User ID (UUID)
/// * `email` - User email
/// * `token_type` - Access or refresh
/// * `ttl` - Lifetime from now; negative values produce an already expired token
///
/// # Returns
/// JWT token string
pub fn create_token(
    keys: &JwtKeys,
    user_id: Uuid,
    email: impl Into<String>,
    token_type: TokenType,
    ttl: TimeDelta,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let exp = now.saturating_add(ttl.num_seconds());

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.into(),
        token_type,
        exp: exp.max(0) as u64,
        iat: now.max(0) as u64,
    };

    encode(&Header::default(), &claims, &keys.encoding)
}

/// Verify and decode a JWT token
///
/// Checks the HS256 signature and expiry.
pub fn verify_token(keys: &JwtKeys, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::default();
    let token_data = decode::<Claims>(token, &keys.decoding, &validation)?;
    Ok(token_data.claims)
}
