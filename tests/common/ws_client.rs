//! WebSocket client helpers built on tokio-tungstenite

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Connect with the credential in the query string
pub async fn connect_with_query(url: &str) -> Client {
    let (client, _) = connect_async(url).await.expect("WebSocket handshake failed");
    client
}

/// Connect with the credential in the session cookie
pub async fn connect_with_cookie(url: &str, cookie_name: &str, token: &str) -> Client {
    let mut request = url.into_client_request().expect("Invalid WebSocket URL");
    let cookie = HeaderValue::from_str(&format!("{}={}", cookie_name, token)).expect("Invalid cookie");
    request.headers_mut().insert("Cookie", cookie);
    let (client, _) = connect_async(request).await.expect("WebSocket handshake failed");
    client
}

/// Status of a handshake that is expected to be rejected
pub async fn rejected_status(url: &str) -> StatusCode {
    match connect_async(url).await {
        Ok(_) => panic!("handshake unexpectedly succeeded"),
        Err(WsError::Http(response)) => response.status(),
        Err(other) => panic!("unexpected handshake error: {}", other),
    }
}

pub async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::text(value.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Next event whose `type` is not in `skip`
///
/// Panics if nothing arrives within two seconds or the socket ends.
pub async fn next_event_skipping(client: &mut Client, skip: &[&str]) -> Value {
    loop {
        let message = timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for an event")
            .expect("socket ended")
            .expect("socket error");
        let Message::Text(text) = message else {
            continue;
        };
        let event: Value = serde_json::from_str(text.as_str()).expect("event is not JSON");
        if skip.iter().any(|kind| event["type"] == *kind) {
            continue;
        }
        return event;
    }
}

/// Next event that is not a presence announcement
pub async fn next_event(client: &mut Client) -> Value {
    next_event_skipping(client, &["user.presence"]).await
}

/// Read until the server closes the socket, skipping any events still in flight
///
/// Panics if the socket stays open for two seconds.
pub async fn expect_closed(client: &mut Client) {
    let closed = timeout(RECV_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "socket was not closed by the server");
}
