//! Authentication test helpers
//!
//! Mints tokens signed with the secret the test gateway verifies against.

use chrono::TimeDelta;
use huddle::backend::auth::{create_token, JwtKeys, TokenType};
use uuid::Uuid;

/// Secret shared by every test gateway
pub const TEST_SECRET: &str = "huddle-test-secret";

/// Test subject and a valid access token for it
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            token: access_token(id),
        }
    }
}

/// Access token valid for one hour
pub fn access_token(subject: Uuid) -> String {
    mint(subject, TokenType::Access, TimeDelta::hours(1))
}

/// Token with an arbitrary type and lifetime
pub fn mint(subject: Uuid, token_type: TokenType, ttl: TimeDelta) -> String {
    let keys = JwtKeys::from_secret(TEST_SECRET.as_bytes());
    tokio_test::assert_ok!(create_token(
        &keys,
        subject,
        format!("{}@test.huddle", subject),
        token_type,
        ttl,
    ))
}
