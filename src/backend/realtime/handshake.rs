//! WebSocket upgrade endpoint.
//!
//! `Unauthenticated -> Authenticating -> Registered -> Open -> Closing -> Closed`
//!
//! Authentication happens in the `AuthSubject` extractor, which runs before
//! the upgrade is negotiated: a request without a valid credential gets a
//! `401` and never reaches `on_upgrade`. The credential is not re-checked
//! after this point; a connection stays open until its transport closes even
//! if the token behind it is revoked.

use crate::backend::middleware::AuthSubject;
use crate::backend::realtime::session::run_session;
use crate::backend::server::state::AppState;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;

/// Handle `GET /ws`
pub async fn ws_handler(
    AuthSubject(subject): AuthSubject,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_failed_upgrade(move |e| {
        tracing::warn!(subject = %subject, error = %e, "websocket upgrade failed");
    })
    .on_upgrade(move |socket| run_session(socket, subject, state))
}
