/**
 * Presence Coordinator
 *
 * Persists a subject's presence and announces the change through the fanout
 * router.
 *
 * # Announcements
 *
 * One `user.presence` event per workspace the subject belongs to, so everyone
 * sharing a workspace sees the change. A subject with no workspaces (or whose
 * memberships cannot be loaded) gets a single event on its own subject scope.
 *
 * A failed store write suppresses the announcement; the error is returned for
 * the caller to log.
 */

use crate::backend::auth::MembershipProvider;
use crate::backend::presence::store::{PresenceError, PresenceStatus, PresenceStore};
use crate::backend::realtime::{BroadcastReport, FanoutRouter};
use crate::shared::{OutboundEvent, Scope, SubjectId};
use std::sync::Arc;

/// Presence coordinator
#[derive(Clone)]
pub struct PresenceCoordinator {
    store: Arc<dyn PresenceStore>,
    membership: Arc<dyn MembershipProvider>,
    router: FanoutRouter,
}

impl PresenceCoordinator {
    pub fn new(
        store: Arc<dyn PresenceStore>,
        membership: Arc<dyn MembershipProvider>,
        router: FanoutRouter,
    ) -> Self {
        Self {
            store,
            membership,
            router,
        }
    }

    /// Mark a subject online after one of its connections registered
    pub async fn connected(&self, subject: SubjectId) -> Result<BroadcastReport, PresenceError> {
        self.set_status(subject, PresenceStatus::Online).await
    }

    /// Mark a subject offline if it has no live connections left
    ///
    /// Returns `None` without touching the store while other connections of
    /// the subject are still registered. If the subject reconnects while the
    /// offline status is being written, online is written again afterwards.
    pub async fn disconnected(&self, subject: SubjectId) -> Result<Option<BroadcastReport>, PresenceError> {
        let remaining = self.router.registry().connection_count_for(subject);
        if remaining > 0 {
            tracing::debug!(subject = %subject, remaining, "subject still connected, presence unchanged");
            return Ok(None);
        }
        let report = self.set_status(subject, PresenceStatus::Offline).await?;

        // A reconnect may have written "online" before this write landed
        if self.router.registry().connection_count_for(subject) > 0 {
            tracing::debug!(subject = %subject, "subject reconnected during offline update, restoring online");
            return self.set_status(subject, PresenceStatus::Online).await.map(Some);
        }
        Ok(Some(report))
    }

    /// Persist `status` and announce it
    pub async fn set_status(
        &self,
        subject: SubjectId,
        status: PresenceStatus,
    ) -> Result<BroadcastReport, PresenceError> {
        self.store.set_status(subject, status).await?;

        let mut report = BroadcastReport::default();
        for scope in self.announce_scopes(subject).await {
            let event = OutboundEvent::presence(subject, status.as_str(), scope)?;
            report += self.router.broadcast(&event);
        }

        tracing::info!(subject = %subject, status = %status, queued = report.queued, "presence updated");
        Ok(report)
    }

    async fn announce_scopes(&self, subject: SubjectId) -> Vec<Scope> {
        let workspaces: Vec<Scope> = match self.membership.scopes_for(subject).await {
            Ok(scopes) => scopes
                .into_iter()
                .filter(|scope| matches!(scope, Scope::Workspace(_)))
                .collect(),
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "could not load workspaces for presence");
                Vec::new()
            }
        };

        if workspaces.is_empty() {
            vec![Scope::Subject(subject)]
        } else {
            workspaces
        }
    }
}
