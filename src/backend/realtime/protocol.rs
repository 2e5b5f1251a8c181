//! Inbound frame handling.
//!
//! Text frames from a client are decoded into `ClientFrame`s and acted on
//! here. Unrecognized or malformed frames are ignored; nothing a client sends
//! can close its own connection through this path.

use crate::backend::auth::MembershipProvider;
use crate::backend::realtime::broadcast::FanoutRouter;
use crate::backend::realtime::connection::Connection;
use crate::shared::{ClientFrame, OutboundEvent, Scope};
use std::sync::Arc;

/// Collaborators needed to act on inbound frames
#[derive(Clone)]
pub struct FrameContext {
    pub router: FanoutRouter,
    pub membership: Arc<dyn MembershipProvider>,
}

/// Act on one text frame received from `conn`
pub async fn handle_text_frame(conn: &Connection, text: &str, ctx: &FrameContext) {
    let Some(frame) = ClientFrame::decode(text) else {
        tracing::trace!(connection_id = %conn.id(), "ignoring unrecognized frame");
        return;
    };

    match &frame {
        ClientFrame::Typing { is_typing, .. } => relay_typing(conn, frame.typing_scope(), *is_typing, ctx),
        ClientFrame::Subscribe { scope } => subscribe(conn, *scope, ctx).await,
        ClientFrame::Unsubscribe { scope } => unsubscribe(conn, scope, ctx),
    }
}

fn relay_typing(conn: &Connection, scope: Option<Scope>, is_typing: bool, ctx: &FrameContext) {
    let Some(scope) = scope else {
        tracing::trace!(connection_id = %conn.id(), "typing frame without a single target");
        return;
    };

    if !ctx.router.registry().is_subscribed(conn.id(), &scope) {
        tracing::debug!(connection_id = %conn.id(), scope = %scope, "typing for unsubscribed scope ignored");
        return;
    }

    match OutboundEvent::typing(conn.subject(), scope, is_typing) {
        Ok(event) => {
            ctx.router.broadcast_except(&event, conn.id());
        }
        Err(e) => tracing::debug!(connection_id = %conn.id(), error = %e, "could not build typing event"),
    }
}

async fn subscribe(conn: &Connection, scope: Scope, ctx: &FrameContext) {
    match ctx.membership.can_subscribe(conn.subject(), scope).await {
        Ok(true) => {
            if ctx.router.registry().subscribe(conn.id(), scope) {
                tracing::debug!(connection_id = %conn.id(), scope = %scope, "subscribed");
            }
        }
        Ok(false) => {
            tracing::info!(
                connection_id = %conn.id(),
                subject = %conn.subject(),
                scope = %scope,
                "subscription denied"
            );
        }
        Err(e) => {
            tracing::warn!(connection_id = %conn.id(), scope = %scope, error = %e, "membership check failed");
        }
    }
}

fn unsubscribe(conn: &Connection, scope: &Scope, ctx: &FrameContext) {
    if *scope == Scope::Subject(conn.subject()) {
        tracing::debug!(connection_id = %conn.id(), "cannot leave own subject scope");
        return;
    }
    if ctx.router.registry().unsubscribe(conn.id(), scope) {
        tracing::debug!(connection_id = %conn.id(), scope = %scope, "unsubscribed");
    }
}
