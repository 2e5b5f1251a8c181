//! Gateway served on an ephemeral port
//!
//! Uses the in-memory membership and presence collaborators so tests can
//! grant scopes and observe status changes without a database.

use super::auth_helpers::TEST_SECRET;
use huddle::backend::auth::{InMemoryMembership, JwtVerifier};
use huddle::backend::presence::InMemoryPresenceStore;
use huddle::backend::routes::create_router;
use huddle::backend::server::AppState;
use huddle::shared::GatewayConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

pub struct TestGateway {
    pub addr: SocketAddr,
    pub state: AppState,
    pub membership: InMemoryMembership,
    pub presence: InMemoryPresenceStore,
    server: JoinHandle<()>,
}

impl TestGateway {
    pub async fn spawn() -> Self {
        Self::spawn_with(GatewayConfig::default()).await
    }

    pub async fn spawn_with(config: GatewayConfig) -> Self {
        let membership = InMemoryMembership::new();
        let presence = InMemoryPresenceStore::new();
        let state = AppState::new(
            config,
            Arc::new(JwtVerifier::from_secret(TEST_SECRET)),
            Arc::new(membership.clone()),
            Arc::new(presence.clone()),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local address");
        let app = create_router(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test gateway failed");
        });

        Self {
            addr,
            state,
            membership,
            presence,
            server,
        }
    }

    /// Upgrade URL without a credential
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Upgrade URL carrying `token` as a query parameter
    pub fn ws_url_with_token(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }

    /// Poll until `condition` holds, panicking after two seconds
    pub async fn wait_until(&self, what: &str, condition: impl Fn(&AppState) -> bool) {
        let polled = timeout(Duration::from_secs(2), async {
            while !condition(&self.state) {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(polled.is_ok(), "timed out waiting for {}", what);
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.server.abort();
    }
}
