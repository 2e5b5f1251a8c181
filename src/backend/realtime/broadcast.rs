/**
 * Fanout Router
 *
 * The sole programmatic entry point for pushing real-time updates.
 *
 * `broadcast` resolves the event's scope through the registry and enqueues a
 * clone of the event on every returned connection. Cloning an event only
 * bumps reference counts, so the business payload is never copied.
 *
 * # Delivery
 *
 * Best-effort, unordered across connections, ordered per connection. A full
 * queue drops the event for that connection only and is reported in the
 * returned `BroadcastReport`, never as an error: by the time an event is
 * broadcast the business action behind it has already completed.
 */

use crate::backend::realtime::connection::{ConnectionId, EnqueueOutcome};
use crate::backend::realtime::registry::Registry;
use crate::shared::OutboundEvent;
use serde::Serialize;
use std::ops::AddAssign;

/// Per-broadcast delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Connections the scope resolved to
    pub targeted: usize,
    /// Events placed in a queue
    pub queued: usize,
    /// Events discarded because a queue was full
    pub dropped: usize,
    /// Connections that closed between resolve and enqueue
    pub closed: usize,
}

impl AddAssign for BroadcastReport {
    fn add_assign(&mut self, other: Self) {
        self.targeted += other.targeted;
        self.queued += other.queued;
        self.dropped += other.dropped;
        self.closed += other.closed;
    }
}

/// Fans events out to the connections of a scope
#[derive(Debug, Clone)]
pub struct FanoutRouter {
    registry: Registry,
}

impl FanoutRouter {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Broadcast an event to every connection of its scope
    ///
    /// Never blocks on a connection's queue. An empty scope is not an error.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use huddle::backend::realtime::{FanoutRouter, Registry};
    /// use huddle::shared::{EventKind, OutboundEvent, Scope};
    ///
    /// # fn example(channel_id: uuid::Uuid) -> Result<(), huddle::shared::SharedError> {
    /// let router = FanoutRouter::new(Registry::new());
    /// let event = OutboundEvent::new(
    ///     EventKind::MessageCreated,
    ///     Scope::Channel(channel_id),
    ///     r#"{"id":"42","content":"hello"}"#,
    /// )?;
    /// let report = router.broadcast(&event);
    /// println!("queued for {} connections", report.queued);
    /// # Ok(())
    /// # }
    /// ```
    pub fn broadcast(&self, event: &OutboundEvent) -> BroadcastReport {
        self.fanout(event, None)
    }

    /// Broadcast to the event's scope, skipping one connection
    ///
    /// Used for relaying client frames back to everyone but the sender.
    pub fn broadcast_except(&self, event: &OutboundEvent, skip: ConnectionId) -> BroadcastReport {
        self.fanout(event, Some(skip))
    }

    fn fanout(&self, event: &OutboundEvent, skip: Option<ConnectionId>) -> BroadcastReport {
        let targets = self.registry.resolve(event.scope());

        let mut report = BroadcastReport::default();
        for connection in targets {
            if Some(connection.id()) == skip {
                continue;
            }
            report.targeted += 1;
            match connection.enqueue(event.clone()) {
                EnqueueOutcome::Queued => report.queued += 1,
                EnqueueOutcome::Dropped => report.dropped += 1,
                EnqueueOutcome::Closed => report.closed += 1,
            }
        }

        if report.targeted == 0 {
            tracing::debug!(kind = %event.kind(), scope = %event.scope(), "no connections for scope");
        } else if report.dropped > 0 {
            tracing::warn!(
                kind = %event.kind(),
                scope = %event.scope(),
                targeted = report.targeted,
                dropped = report.dropped,
                "broadcast dropped events for slow connections"
            );
        } else {
            tracing::debug!(
                kind = %event.kind(),
                scope = %event.scope(),
                queued = report.queued,
                "event broadcast"
            );
        }

        report
    }
}
