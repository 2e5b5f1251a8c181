/**
 * Gateway Route Handlers
 *
 * # Routes
 *
 * - `GET /ws` - WebSocket upgrade (credential required)
 * - `GET /health` - Liveness and registry counters
 */

use crate::backend::realtime::{ws_handler, Registry};
use crate::backend::server::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub subjects: usize,
    pub scopes: usize,
}

/// Handle `GET /health`
pub async fn health(State(registry): State<Registry>) -> Json<HealthResponse> {
    let stats = registry.stats();
    Json(HealthResponse {
        status: "ok",
        connections: stats.connections,
        subjects: stats.subjects,
        scopes: stats.scopes,
    })
}

/// Configure gateway routes
pub fn configure_gateway_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
}
