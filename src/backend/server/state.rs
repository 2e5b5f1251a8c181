/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is built once at startup and owns the gateway's single
 * `Registry`. The fanout router and presence coordinator are constructed
 * around that registry and handed the collaborators they need; nothing is a
 * process-wide singleton.
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and shares its internals through `Arc`:
 * - `Registry` serializes mutation behind one mutex
 * - Collaborators are `Arc<dyn Trait + Send + Sync>`
 * - `Option<PgPool>` is `None` when no database is configured
 *
 * # Example
 *
 * ```rust,no_run
 * use huddle::backend::server::state::AppState;
 * use huddle::shared::{EventKind, OutboundEvent, Scope};
 * use axum::extract::State;
 *
 * async fn on_message_saved(State(state): State<AppState>, channel_id: uuid::Uuid, body: String) {
 *     if let Ok(event) = OutboundEvent::new(EventKind::MessageCreated, Scope::Channel(channel_id), body) {
 *         state.fanout.broadcast(&event);
 *     }
 * }
 * ```
 */

use crate::backend::auth::{IdentityVerifier, MembershipProvider};
use crate::backend::presence::{PresenceCoordinator, PresenceStore};
use crate::backend::realtime::{FanoutRouter, Registry};
use crate::shared::GatewayConfig;
use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared by every handler and connection
#[derive(Clone)]
pub struct AppState {
    /// Validated gateway tunables
    pub config: Arc<GatewayConfig>,

    /// Live connections and their scope associations
    pub registry: Registry,

    /// Entry point for pushing events to connections
    pub fanout: FanoutRouter,

    /// Online/offline tracking
    pub presence: PresenceCoordinator,

    /// Handshake credential verification
    pub verifier: Arc<dyn IdentityVerifier>,

    /// Scope authorization
    pub membership: Arc<dyn MembershipProvider>,

    /// Database connection pool
    ///
    /// `None` if `DATABASE_URL` is not set or the database is unreachable;
    /// in-memory collaborators are used instead.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Build the state around a fresh registry
    pub fn new(
        config: GatewayConfig,
        verifier: Arc<dyn IdentityVerifier>,
        membership: Arc<dyn MembershipProvider>,
        presence_store: Arc<dyn PresenceStore>,
    ) -> Self {
        let registry = Registry::new();
        let fanout = FanoutRouter::new(registry.clone());
        let presence = PresenceCoordinator::new(presence_store, membership.clone(), fanout.clone());

        Self {
            config: Arc::new(config),
            registry,
            fanout,
            presence,
            verifier,
            membership,
            db_pool: None,
        }
    }

    /// Attach the database pool the collaborators were built from
    pub fn with_db_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }
}

impl FromRef<AppState> for FanoutRouter {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.fanout.clone()
    }
}

impl FromRef<AppState> for Registry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
