//! Presence persistence.
//!
//! The gateway writes presence and then announces it; it never reads it back.

use crate::shared::SubjectId;
use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Presence of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
    Away,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Away => "away",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence update errors
#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("failed to persist presence: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unknown user {0}")]
    UnknownSubject(SubjectId),
    #[error("failed to build presence event: {0}")]
    Event(#[from] crate::shared::SharedError),
}

/// Persists a subject's presence status
pub trait PresenceStore: Send + Sync {
    fn set_status(&self, subject: SubjectId, status: PresenceStatus) -> BoxFuture<'_, Result<(), PresenceError>>;
}

/// Writes `users.status`
#[derive(Debug, Clone)]
pub struct PgPresenceStore {
    pool: PgPool,
}

impl PgPresenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update(&self, subject: SubjectId, status: PresenceStatus) -> Result<(), PresenceError> {
        let result = sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(subject)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PresenceError::UnknownSubject(subject));
        }
        Ok(())
    }
}

impl PresenceStore for PgPresenceStore {
    fn set_status(&self, subject: SubjectId, status: PresenceStatus) -> BoxFuture<'_, Result<(), PresenceError>> {
        self.update(subject, status).boxed()
    }
}

/// In-process presence table
#[derive(Debug, Clone, Default)]
pub struct InMemoryPresenceStore {
    statuses: Arc<Mutex<HashMap<SubjectId, PresenceStatus>>>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last status written for `subject`
    pub fn status(&self, subject: SubjectId) -> Option<PresenceStatus> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&subject)
            .copied()
    }
}

impl PresenceStore for InMemoryPresenceStore {
    fn set_status(&self, subject: SubjectId, status: PresenceStatus) -> BoxFuture<'_, Result<(), PresenceError>> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject, status);
        async { Ok(()) }.boxed()
    }
}
