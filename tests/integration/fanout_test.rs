//! Fanout, subscription and typing relay over live sockets

use crate::common::*;
use huddle::shared::{EventKind, GatewayConfig, OutboundEvent, Scope};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

fn message(scope: Scope, seq: u32) -> OutboundEvent {
    OutboundEvent::json(EventKind::MessageCreated, scope, &json!({"seq": seq})).unwrap()
}

#[tokio::test]
async fn test_every_connection_of_a_subject_receives_once() {
    let gateway = TestGateway::spawn().await;
    let user = TestUser::new();
    let channel = Scope::Channel(Uuid::new_v4());
    gateway.membership.grant(user.id, channel);

    let mut first = connect_with_query(&gateway.ws_url_with_token(&user.token)).await;
    let mut second = connect_with_query(&gateway.ws_url_with_token(&user.token)).await;
    gateway
        .wait_until("both connections in channel", |state| {
            state.registry.resolve(&channel).len() == 2
        })
        .await;

    let report = gateway.state.fanout.broadcast(&message(channel, 1));
    assert_eq!(report.targeted, 2);
    assert_eq!(report.queued, 2);
    gateway.state.fanout.broadcast(&message(channel, 2));

    for client in [&mut first, &mut second] {
        let one = next_event(client).await;
        let two = next_event(client).await;
        assert_eq!(one["payload"]["seq"], 1);
        assert_eq!(one["channel_id"], json!(channel.id()));
        assert_eq!(two["payload"]["seq"], 2);
    }
}

#[tokio::test]
async fn test_outsiders_do_not_receive_channel_events() {
    let gateway = TestGateway::spawn().await;
    let member = TestUser::new();
    let outsider = TestUser::new();
    let channel = Scope::Channel(Uuid::new_v4());
    gateway.membership.grant(member.id, channel);

    let _member_client = connect_with_query(&gateway.ws_url_with_token(&member.token)).await;
    let mut outsider_client = connect_with_query(&gateway.ws_url_with_token(&outsider.token)).await;
    gateway
        .wait_until("both subjects registered", |state| {
            state.registry.resolve(&channel).len() == 1
                && state.registry.resolve(&Scope::Subject(outsider.id)).len() == 1
        })
        .await;

    let report = gateway.state.fanout.broadcast(&message(channel, 1));
    assert_eq!(report.targeted, 1);

    gateway.state.fanout.broadcast(&message(Scope::Subject(outsider.id), 99));
    let received = next_event(&mut outsider_client).await;
    assert_eq!(received["payload"]["seq"], 99);
}

#[tokio::test]
async fn test_closed_connection_is_not_targeted() {
    let gateway = TestGateway::spawn().await;
    let user = TestUser::new();
    let dm = Scope::Dm(Uuid::new_v4());
    gateway.membership.grant(user.id, dm);

    let mut client = connect_with_query(&gateway.ws_url_with_token(&user.token)).await;
    gateway
        .wait_until("dm associated", |state| state.registry.resolve(&dm).len() == 1)
        .await;

    client.close(None).await.unwrap();
    gateway
        .wait_until("connection unregistered", |state| {
            state.registry.stats().connections == 0
        })
        .await;

    let report = gateway.state.fanout.broadcast(&message(dm, 1));
    assert_eq!(report.targeted, 0);
    assert_eq!(gateway.state.registry.stats().scopes, 0);
}

#[tokio::test]
async fn test_subscribe_requires_membership() {
    let gateway = TestGateway::spawn().await;
    let user = TestUser::new();
    let channel = Scope::Channel(Uuid::new_v4());

    let mut client = connect_with_query(&gateway.ws_url_with_token(&user.token)).await;
    gateway
        .wait_until("connection registered", |state| {
            state.registry.resolve(&Scope::Subject(user.id)).len() == 1
        })
        .await;

    send_json(&mut client, json!({"type": "subscribe", "scope": channel})).await;
    sleep(Duration::from_millis(100)).await;
    assert!(gateway.state.registry.resolve(&channel).is_empty());

    gateway.membership.grant(user.id, channel);
    send_json(&mut client, json!({"type": "subscribe", "scope": channel})).await;
    gateway
        .wait_until("channel subscribed", |state| state.registry.resolve(&channel).len() == 1)
        .await;

    gateway.state.fanout.broadcast(&message(channel, 1));
    assert_eq!(next_event(&mut client).await["payload"]["seq"], 1);

    send_json(&mut client, json!({"type": "unsubscribe", "scope": channel})).await;
    gateway
        .wait_until("channel unsubscribed", |state| state.registry.resolve(&channel).is_empty())
        .await;
}

#[tokio::test]
async fn test_typing_reaches_peers_but_not_sender() {
    let gateway = TestGateway::spawn().await;
    let alice = TestUser::new();
    let bob = TestUser::new();
    let channel = Scope::Channel(Uuid::new_v4());
    gateway.membership.grant(alice.id, channel);
    gateway.membership.grant(bob.id, channel);

    let mut alice_client = connect_with_query(&gateway.ws_url_with_token(&alice.token)).await;
    let mut bob_client = connect_with_query(&gateway.ws_url_with_token(&bob.token)).await;
    gateway
        .wait_until("both in channel", |state| state.registry.resolve(&channel).len() == 2)
        .await;

    send_json(
        &mut alice_client,
        json!({"type": "user.typing", "channel_id": channel.id(), "is_typing": true}),
    )
    .await;

    let typing = next_event(&mut bob_client).await;
    assert_eq!(typing["type"], "user.typing");
    assert_eq!(typing["channel_id"], json!(channel.id()));
    assert_eq!(typing["payload"]["user_id"], json!(alice.id));
    assert_eq!(typing["payload"]["is_typing"], true);

    // The sender's next event is the marker, not its own typing frame
    gateway.state.fanout.broadcast(&message(channel, 7));
    let next = next_event(&mut alice_client).await;
    assert_eq!(next["type"], "message.new");
    assert_eq!(next["payload"]["seq"], 7);
}

#[tokio::test]
async fn test_typing_into_unsubscribed_scope_is_ignored() {
    let gateway = TestGateway::spawn().await;
    let alice = TestUser::new();
    let bob = TestUser::new();
    let channel = Scope::Channel(Uuid::new_v4());
    gateway.membership.grant(bob.id, channel);

    let mut alice_client = connect_with_query(&gateway.ws_url_with_token(&alice.token)).await;
    let mut bob_client = connect_with_query(&gateway.ws_url_with_token(&bob.token)).await;
    gateway
        .wait_until("both registered", |state| {
            state.registry.resolve(&channel).len() == 1
                && state.registry.resolve(&Scope::Subject(alice.id)).len() == 1
        })
        .await;

    send_json(
        &mut alice_client,
        json!({"type": "user.typing", "channel_id": channel.id(), "is_typing": true}),
    )
    .await;
    sleep(Duration::from_millis(100)).await;

    gateway.state.fanout.broadcast(&message(channel, 1));
    let next = next_event(&mut bob_client).await;
    assert_eq!(next["type"], "message.new");
}

#[tokio::test]
async fn test_stalled_client_is_disconnected() {
    let config = GatewayConfig::builder()
        .queue_capacity(1)
        .max_consecutive_drops(1)
        .build()
        .unwrap();
    let gateway = TestGateway::spawn_with(config).await;
    let user = TestUser::new();
    let own = Scope::Subject(user.id);

    let mut client = connect_with_query(&gateway.ws_url_with_token(&user.token)).await;
    gateway
        .wait_until("connection registered", |state| state.registry.resolve(&own).len() == 1)
        .await;

    // The burst runs without yielding, so the outbound pump cannot drain in between
    let mut report = gateway.state.fanout.broadcast(&message(own, 0));
    for seq in 1..4 {
        report += gateway.state.fanout.broadcast(&message(own, seq));
    }
    assert!(report.dropped >= 2);

    gateway
        .wait_until("stalled connection unregistered", |state| {
            state.registry.stats().connections == 0
        })
        .await;
    assert!(gateway.state.fanout.broadcast(&message(own, 9)).targeted == 0);
    expect_closed(&mut client).await;
}
