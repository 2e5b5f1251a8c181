/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 */

use crate::backend::routes::gateway_routes::configure_gateway_routes;
use crate::backend::server::state::AppState;
use axum::http::StatusCode;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state shared by all handlers
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
///
/// # Route Details
///
/// - `GET /ws` - WebSocket upgrade
/// - `GET /health` - Health check with registry counters
///
/// Unknown routes return `404`.
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = configure_gateway_routes(Router::new());

    router
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
