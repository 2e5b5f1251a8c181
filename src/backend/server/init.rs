/**
 * Server Initialization
 *
 * This module builds the application state and the router.
 *
 * # Initialization Process
 *
 * 1. Connect to the database if one is configured
 * 2. Pick collaborators: PostgreSQL-backed when the pool is available,
 *    in-memory otherwise
 * 3. Build `AppState` around a fresh registry
 * 4. Create the router
 *
 * `shutdown_signal` is handed to `axum::serve(..).with_graceful_shutdown`.
 */

use crate::backend::auth::{InMemoryMembership, JwtVerifier, MembershipProvider, PgMembership};
use crate::backend::presence::{InMemoryPresenceStore, PgPresenceStore, PresenceStore};
use crate::backend::realtime::Registry;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, Settings};
use crate::backend::server::state::AppState;
use axum::Router;
use std::future::Future;
use std::sync::Arc;

/// Create and configure the Axum application
///
/// Returns the router together with the state it serves, so the embedding
/// application can push events through `state.fanout`.
///
/// # Error Handling
///
/// A missing or unreachable database never prevents startup; in-memory
/// membership (deny by default) and presence are used instead.
pub async fn create_app(settings: Settings) -> (Router<()>, AppState) {
    tracing::info!("Initializing Huddle gateway");

    let db_pool = load_database(settings.database_url.as_deref()).await;

    let (membership, presence_store): (Arc<dyn MembershipProvider>, Arc<dyn PresenceStore>) = match &db_pool {
        Some(pool) => (
            Arc::new(PgMembership::new(pool.clone())),
            Arc::new(PgPresenceStore::new(pool.clone())),
        ),
        None => (
            Arc::new(InMemoryMembership::new()),
            Arc::new(InMemoryPresenceStore::new()),
        ),
    };

    let verifier = Arc::new(JwtVerifier::from_secret(&settings.jwt_secret));
    let state = AppState::new(settings.gateway, verifier, membership, presence_store).with_db_pool(db_pool);

    tracing::info!(
        queue_capacity = state.config.queue_capacity,
        max_consecutive_drops = state.config.max_consecutive_drops,
        "gateway state initialized"
    );

    let app = create_router(state.clone());
    (app, state)
}

/// Resolve on Ctrl-C after closing every live connection
pub async fn shutdown_signal(registry: Registry) {
    shutdown_on(registry, tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires, closing every live connection first
///
/// If the signal cannot be installed the future never resolves, so the
/// server keeps running instead of shutting down at startup.
pub async fn shutdown_on<F>(registry: Registry, signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    let closed = registry.close_all();
    tracing::info!("Shutting down, closed {} connections", closed);
}
