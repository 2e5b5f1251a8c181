/**
 * Connection Session
 *
 * Drives one upgraded socket from registration to teardown.
 *
 * # Lifecycle
 *
 * 1. Create the `Connection` and register it (joins its subject scope)
 * 2. Associate it with every scope the membership provider returns
 * 3. Mark the subject online in the background
 * 4. Split the socket and start both pumps
 * 5. Wait for the connection to leave `Open` (either pump, a forced close
 *    from backpressure, or a write failure)
 * 6. Unregister; this is the only place a connection is unregistered
 * 7. Wait for both pumps to exit, then mark the connection `Closed`
 * 8. Mark the subject offline if this was its last connection
 */

use crate::backend::realtime::connection::Connection;
use crate::backend::realtime::protocol::FrameContext;
use crate::backend::realtime::pump::{inbound_pump, outbound_pump};
use crate::backend::server::state::AppState;
use crate::shared::SubjectId;
use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::Instrument;

/// Run a verified connection until it closes
pub async fn run_session(socket: WebSocket, subject: SubjectId, state: AppState) {
    let (conn, queue) = Connection::new(subject, &state.config);
    let span = tracing::info_span!("connection", connection_id = %conn.id(), subject = %subject);

    async move {
        state.registry.register(conn.clone());
        associate_scopes(&conn, &state).await;
        tracing::info!("connection open");

        let presence = state.presence.clone();
        let online = tokio::spawn(
            async move {
                if let Err(e) = presence.connected(subject).await {
                    tracing::warn!(error = %e, "failed to mark subject online");
                }
            }
            .in_current_span(),
        );

        let (sink, stream) = socket.split();
        let ctx = FrameContext {
            router: state.fanout.clone(),
            membership: state.membership.clone(),
        };
        let outbound = tokio::spawn(outbound_pump(conn.clone(), queue, sink).in_current_span());
        let inbound = tokio::spawn(inbound_pump(conn.clone(), stream, ctx).in_current_span());

        conn.closed().await;
        state.registry.unregister(conn.id());

        for (name, handle) in [("outbound", outbound), ("inbound", inbound)] {
            if let Err(e) = handle.await {
                tracing::error!(pump = name, error = %e, "pump task failed");
            }
        }
        conn.mark_closed();

        tracing::info!(
            dropped_total = conn.dropped_total(),
            lifetime_secs = (chrono::Utc::now() - conn.created_at()).num_seconds(),
            "connection closed"
        );

        // Offline must not overtake the online update of this same connection
        let _ = online.await;
        if let Err(e) = state.presence.disconnected(subject).await {
            tracing::warn!(error = %e, "failed to mark subject offline");
        }
    }
    .instrument(span)
    .await
}

async fn associate_scopes(conn: &Arc<Connection>, state: &AppState) {
    match state.membership.scopes_for(conn.subject()).await {
        Ok(scopes) => {
            let count = scopes
                .into_iter()
                .filter(|scope| state.registry.subscribe(conn.id(), *scope))
                .count();
            tracing::debug!(scopes = count, "associated membership scopes");
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not load memberships; only the subject scope is active");
        }
    }
}
