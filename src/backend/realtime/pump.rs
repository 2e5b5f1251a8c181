/**
 * Connection Pumps
 *
 * Two tasks per connection, both generic over the socket halves so they can
 * be driven by an axum `WebSocket` split or by in-memory sinks and streams.
 *
 * - **Outbound pump**: sole consumer of the outbound queue and sole writer to
 *   the sink. A write failure closes the connection.
 * - **Inbound pump**: sole reader of the stream. A read error, a close frame
 *   or the end of the stream closes the connection.
 *
 * Both pumps also watch the connection's close signal, so whichever side
 * fails first stops the other. A write stalled on a dead peer is abandoned as
 * soon as the signal fires.
 */

use crate::backend::realtime::connection::{Connection, OutboundQueue};
use crate::backend::realtime::protocol::{handle_text_frame, FrameContext};
use axum::extract::ws::{Message, Utf8Bytes};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for flushing a close frame to the peer
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drain the outbound queue into `sink` until the connection closes
pub async fn outbound_pump<S>(conn: Arc<Connection>, mut queue: OutboundQueue, mut sink: S)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        let event = tokio::select! {
            biased;
            _ = conn.closed() => break,
            next = queue.next() => match next {
                Some(event) => event,
                None => break,
            },
        };

        let message = match Utf8Bytes::try_from(event.frame().clone()) {
            Ok(text) => Message::Text(text),
            Err(e) => {
                tracing::warn!(connection_id = %conn.id(), error = %e, "frame is not UTF-8, skipped");
                continue;
            }
        };
        let written = tokio::select! {
            biased;
            _ = conn.closed() => break,
            result = sink.send(message) => result,
        };

        if let Err(e) = written {
            tracing::debug!(connection_id = %conn.id(), error = %e, "write failed");
            conn.close();
            break;
        }
    }

    queue.close();
    let discarded = std::iter::from_fn(|| queue.try_next()).count();
    if discarded > 0 {
        tracing::debug!(connection_id = %conn.id(), discarded, "discarded queued events");
    }

    if tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await.is_err() {
        tracing::debug!(connection_id = %conn.id(), "timed out closing socket");
    }
}

/// Read frames from `stream` until the peer goes away or the connection closes
pub async fn inbound_pump<S, E>(conn: Arc<Connection>, mut stream: S, ctx: FrameContext)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = conn.closed() => break,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => handle_text_frame(&conn, text.as_str(), &ctx).await,
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!(connection_id = %conn.id(), ?frame, "peer closed");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(connection_id = %conn.id(), error = %e, "read failed");
                break;
            }
            None => break,
        }
    }

    conn.close();
}
