/**
 * Membership Provider
 *
 * Authorization collaborator consulted when a connection is associated with
 * scopes: once at handshake (`scopes_for`) and whenever a client asks to
 * subscribe to a further scope (`can_subscribe`).
 *
 * # Rules
 *
 * - Workspace: the subject is a workspace member
 * - Channel: private channels need channel membership; public channels need
 *   membership of the channel's workspace
 * - DM: the subject is a participant of the DM session
 * - Subject: only the subject itself
 */

use crate::shared::{Scope, SubjectId};
use futures_util::future::{BoxFuture, FutureExt};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

/// Membership lookup errors
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("membership lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Decides which scopes a subject may receive events for
pub trait MembershipProvider: Send + Sync {
    /// Scopes a freshly connected subject is associated with
    fn scopes_for(&self, subject: SubjectId) -> BoxFuture<'_, Result<Vec<Scope>, MembershipError>>;

    /// Whether `subject` may subscribe to `scope`
    fn can_subscribe(&self, subject: SubjectId, scope: Scope) -> BoxFuture<'_, Result<bool, MembershipError>>;
}

/// PostgreSQL-backed membership
#[derive(Debug, Clone)]
pub struct PgMembership {
    pool: PgPool,
}

impl PgMembership {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_scopes(&self, subject: SubjectId) -> Result<Vec<Scope>, MembershipError> {
        let workspaces: Vec<Uuid> =
            sqlx::query_scalar("SELECT workspace_id FROM workspace_members WHERE user_id = $1")
                .bind(subject)
                .fetch_all(&self.pool)
                .await?;

        let channels: Vec<Uuid> =
            sqlx::query_scalar("SELECT channel_id FROM channel_members WHERE user_id = $1")
                .bind(subject)
                .fetch_all(&self.pool)
                .await?;

        let dms: Vec<Uuid> = sqlx::query_scalar("SELECT dm_id FROM dm_participants WHERE user_id = $1")
            .bind(subject)
            .fetch_all(&self.pool)
            .await?;

        let mut scopes = Vec::with_capacity(workspaces.len() + channels.len() + dms.len());
        scopes.extend(workspaces.into_iter().map(Scope::Workspace));
        scopes.extend(channels.into_iter().map(Scope::Channel));
        scopes.extend(dms.into_iter().map(Scope::Dm));
        Ok(scopes)
    }

    async fn check(&self, subject: SubjectId, scope: Scope) -> Result<bool, MembershipError> {
        let allowed = match scope {
            Scope::Subject(id) => id == subject,
            Scope::Workspace(workspace_id) => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM workspace_members WHERE workspace_id = $1 AND user_id = $2)",
                )
                .bind(workspace_id)
                .bind(subject)
                .fetch_one(&self.pool)
                .await?
            }
            Scope::Channel(channel_id) => {
                let row: Option<(bool, bool, bool)> = sqlx::query_as(
                    r#"
                    SELECT
                        c.is_private,
                        EXISTS(SELECT 1 FROM channel_members cm WHERE cm.channel_id = c.id AND cm.user_id = $2),
                        EXISTS(SELECT 1 FROM workspace_members wm WHERE wm.workspace_id = c.workspace_id AND wm.user_id = $2)
                    FROM channels c
                    WHERE c.id = $1
                    "#,
                )
                .bind(channel_id)
                .bind(subject)
                .fetch_optional(&self.pool)
                .await?;

                match row {
                    Some((true, channel_member, _)) => channel_member,
                    Some((false, _, workspace_member)) => workspace_member,
                    None => false,
                }
            }
            Scope::Dm(dm_id) => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM dm_participants WHERE dm_id = $1 AND user_id = $2)",
                )
                .bind(dm_id)
                .bind(subject)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(allowed)
    }
}

impl MembershipProvider for PgMembership {
    fn scopes_for(&self, subject: SubjectId) -> BoxFuture<'_, Result<Vec<Scope>, MembershipError>> {
        self.load_scopes(subject).boxed()
    }

    fn can_subscribe(&self, subject: SubjectId, scope: Scope) -> BoxFuture<'_, Result<bool, MembershipError>> {
        self.check(subject, scope).boxed()
    }
}

/// In-process membership table
///
/// Denies everything that was not granted. Used when no database is
/// configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMembership {
    grants: Arc<Mutex<HashMap<SubjectId, HashSet<Scope>>>>,
}

impl InMemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, subject: SubjectId, scope: Scope) {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(subject)
            .or_default()
            .insert(scope);
    }

    pub fn revoke(&self, subject: SubjectId, scope: &Scope) -> bool {
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(scopes) = grants.get_mut(&subject) else {
            return false;
        };
        let removed = scopes.remove(scope);
        if scopes.is_empty() {
            grants.remove(&subject);
        }
        removed
    }

    fn granted(&self, subject: SubjectId) -> Vec<Scope> {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&subject)
            .map(|scopes| scopes.iter().copied().collect())
            .unwrap_or_default()
    }

    fn allows(&self, subject: SubjectId, scope: &Scope) -> bool {
        if *scope == Scope::Subject(subject) {
            return true;
        }
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&subject)
            .is_some_and(|scopes| scopes.contains(scope))
    }
}

impl MembershipProvider for InMemoryMembership {
    fn scopes_for(&self, subject: SubjectId) -> BoxFuture<'_, Result<Vec<Scope>, MembershipError>> {
        let scopes = self.granted(subject);
        async move { Ok(scopes) }.boxed()
    }

    fn can_subscribe(&self, subject: SubjectId, scope: Scope) -> BoxFuture<'_, Result<bool, MembershipError>> {
        let allowed = self.allows(subject, &scope);
        async move { Ok(allowed) }.boxed()
    }
}
