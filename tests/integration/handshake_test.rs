//! Handshake authentication tests

use crate::common::*;
use chrono::TimeDelta;
use huddle::backend::auth::TokenType;
use huddle::shared::{EventKind, OutboundEvent, Scope};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_tungstenite::tungstenite::http::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_credential_is_rejected() {
    let gateway = TestGateway::spawn().await;
    assert_eq!(rejected_status(&gateway.ws_url()).await, StatusCode::UNAUTHORIZED);
    assert_eq!(gateway.state.registry.stats().connections, 0);
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    let gateway = TestGateway::spawn().await;
    let subject = Uuid::new_v4();

    let forged = "eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl";
    let expired = mint(subject, TokenType::Access, TimeDelta::hours(-2));
    let refresh = mint(subject, TokenType::Refresh, TimeDelta::hours(1));

    for token in [forged.to_string(), expired, refresh] {
        let status = rejected_status(&gateway.ws_url_with_token(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(gateway.state.registry.stats().connections, 0);
}

#[tokio::test]
async fn test_query_token_registers_connection() {
    let gateway = TestGateway::spawn().await;
    let user = TestUser::new();

    let _client = connect_with_query(&gateway.ws_url_with_token(&user.token)).await;
    gateway
        .wait_until("connection registered", |state| {
            state.registry.connection_count_for(user.id) == 1
        })
        .await;
}

#[tokio::test]
async fn test_cookie_credential_reaches_subject_scope() {
    let gateway = TestGateway::spawn().await;
    let user = TestUser::new();
    let cookie = gateway.state.config.session_cookie.clone();

    let mut client = connect_with_cookie(&gateway.ws_url(), &cookie, &user.token).await;
    gateway
        .wait_until("subject scope associated", |state| {
            state.registry.resolve(&Scope::Subject(user.id)).len() == 1
        })
        .await;

    let event = OutboundEvent::json(
        EventKind::WorkspaceJoined,
        Scope::Subject(user.id),
        &json!({"workspace": "acme"}),
    )
    .unwrap();
    let report = gateway.state.fanout.broadcast(&event);
    assert_eq!(report.targeted, 1);

    let received = next_event(&mut client).await;
    assert_eq!(
        received,
        json!({"type": "workspace.joined", "payload": {"workspace": "acme"}, "user_id": user.id})
    );
}

#[tokio::test]
async fn test_query_token_can_be_disabled() {
    let config = huddle::shared::GatewayConfig::builder()
        .allow_query_token(false)
        .build()
        .unwrap();
    let gateway = TestGateway::spawn_with(config).await;
    let user = TestUser::new();

    let status = rejected_status(&gateway.ws_url_with_token(&user.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
