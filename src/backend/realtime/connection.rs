/**
 * Connection
 *
 * One live duplex transport bound to one authenticated subject.
 *
 * A `Connection` owns the sending half of a bounded outbound queue. The
 * receiving half (`OutboundQueue`) is handed to the outbound pump, which is
 * the only consumer and the only writer to the socket.
 *
 * # State
 *
 * `Open -> Closing -> Closed`, stored in an atomic and only ever advanced with
 * `fetch_max`, so the state can never move backwards.
 *
 * # Backpressure
 *
 * `enqueue` never waits. When the queue is full the event is dropped for this
 * connection only and the consecutive-drop streak grows; a successful enqueue
 * resets it. Once the streak passes the configured threshold the connection
 * is closed so a stalled peer cannot pin resources forever.
 */

use crate::shared::config::MAX_QUEUE_CAPACITY;
use crate::shared::{GatewayConfig, OutboundEvent, SubjectId};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use uuid::Uuid;

/// Process-unique connection identifier
pub type ConnectionId = Uuid;

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Result of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The event is in the queue
    Queued,
    /// The queue was full; the event was discarded for this connection
    Dropped,
    /// The connection is no longer open
    Closed,
}

/// Receiving half of a connection's outbound queue
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<OutboundEvent>,
}

impl OutboundQueue {
    /// Wait for the next event; `None` once the queue is closed and drained
    pub async fn next(&mut self) -> Option<OutboundEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is resident
    pub fn try_next(&mut self) -> Option<OutboundEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting events; resident events can still be taken
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// A live connection
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    subject: SubjectId,
    created_at: DateTime<Utc>,
    queue: mpsc::Sender<OutboundEvent>,
    state: AtomicU8,
    consecutive_drops: AtomicU32,
    dropped_total: AtomicU64,
    max_consecutive_drops: u32,
    shutdown: watch::Sender<bool>,
}

impl Connection {
    /// Create a connection for `subject` together with its outbound queue
    ///
    /// The queue capacity and drop threshold come from `config`. A capacity
    /// outside `1..=MAX_QUEUE_CAPACITY` is clamped into that range.
    pub fn new(subject: SubjectId, config: &GatewayConfig) -> (Arc<Self>, OutboundQueue) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.clamp(1, MAX_QUEUE_CAPACITY));
        let (shutdown, _) = watch::channel(false);

        let connection = Arc::new(Self {
            id: Uuid::new_v4(),
            subject,
            created_at: Utc::now(),
            queue: tx,
            state: AtomicU8::new(ConnectionState::Open as u8),
            consecutive_drops: AtomicU32::new(0),
            dropped_total: AtomicU64::new(0),
            max_consecutive_drops: config.max_consecutive_drops,
            shutdown,
        });

        (connection, OutboundQueue { rx })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn subject(&self) -> SubjectId {
        self.subject
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// True while the consecutive-drop streak is non-zero
    pub fn is_degraded(&self) -> bool {
        self.consecutive_drops.load(Ordering::Relaxed) > 0
    }

    pub fn consecutive_drops(&self) -> u32 {
        self.consecutive_drops.load(Ordering::Relaxed)
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }

    /// Events currently resident in the outbound queue
    pub fn pending(&self) -> usize {
        self.queue.max_capacity() - self.queue.capacity()
    }

    /// Push an event without waiting
    pub fn enqueue(&self, event: OutboundEvent) -> EnqueueOutcome {
        if !self.is_open() {
            return EnqueueOutcome::Closed;
        }

        match self.queue.try_send(event) {
            Ok(()) => {
                self.consecutive_drops.store(0, Ordering::Relaxed);
                EnqueueOutcome::Queued
            }
            Err(TrySendError::Full(event)) => {
                let streak = self.consecutive_drops.fetch_add(1, Ordering::Relaxed) + 1;
                self.dropped_total.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    connection_id = %self.id,
                    kind = %event.kind(),
                    streak,
                    "outbound queue full, event dropped"
                );

                if streak > self.max_consecutive_drops && self.close() {
                    tracing::warn!(
                        connection_id = %self.id,
                        subject = %self.subject,
                        streak,
                        dropped_total = self.dropped_total(),
                        "closing stalled connection"
                    );
                }
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                self.close();
                EnqueueOutcome::Closed
            }
        }
    }

    /// Leave the `Open` state and signal both pumps
    ///
    /// Returns true only for the call that initiated closing.
    pub fn close(&self) -> bool {
        let previous = self
            .state
            .fetch_max(ConnectionState::Closing as u8, Ordering::AcqRel);
        if previous != ConnectionState::Open as u8 {
            return false;
        }

        self.shutdown.send_replace(true);
        tracing::debug!(connection_id = %self.id, subject = %self.subject, "connection closing");
        true
    }

    /// Final transition once both pumps have exited
    pub(crate) fn mark_closed(&self) {
        self.state
            .fetch_max(ConnectionState::Closed as u8, Ordering::AcqRel);
        self.shutdown.send_replace(true);
    }

    /// Resolves once the connection has left the `Open` state
    pub async fn closed(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|closing| *closing).await;
    }
}
