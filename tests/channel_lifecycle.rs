mod support;

use pushr_client::{
    ChannelEvent, ChannelOptions, Intent, Persistence, PushrClientOptions, WireMessage,
};
use serde_json::json;
use support::connected_client;
use tokio::time::{sleep, timeout, Duration};

fn options() -> PushrClientOptions {
    PushrClientOptions {
        auth: Some(json!("client-credential")),
        persistence: Persistence {
            enabled: false,
            ..Default::default()
        },
    }
}

async fn next_event(
    events: &mut tokio::sync::mpsc::Receiver<ChannelEvent>,
) -> ChannelEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a channel event")
        .expect("channel observer closed")
}

#[tokio::test]
async fn subscribe_round_trip_flips_subscribed_on_ack() {
    let (_server, mut conn, client) = connected_client(options()).await;

    let channel = client.channel("room:1", Default::default()).await;
    let mut events = channel.events().await;

    client.subscribe("room:1", Default::default()).await.unwrap();
    assert_eq!(next_event(&mut events).await, ChannelEvent::WillOpen);

    let sub = conn.recv().await;
    assert_eq!(sub.intent, Intent::SubReq);
    assert_eq!(sub.topic.as_deref(), Some("room:1"));
    assert_eq!(sub.payload["auth"], json!("client-credential"));
    assert!(!channel.subscribed().await);

    conn.send(WireMessage::new(
        Intent::SubAck,
        Some("room:1".to_string()),
        json!({}),
    ))
    .await;

    assert_eq!(next_event(&mut events).await, ChannelEvent::DidOpen(json!({})));
    assert!(channel.subscribed().await);
}

#[tokio::test]
async fn rejection_notifies_without_state_change_or_retry() {
    let (_server, mut conn, client) = connected_client(options()).await;

    let channel = client.channel("room:1", Default::default()).await;
    let mut events = channel.events().await;
    channel.open().await.unwrap();
    assert_eq!(next_event(&mut events).await, ChannelEvent::WillOpen);
    assert_eq!(conn.recv().await.intent, Intent::SubReq);

    conn.send(WireMessage::new(
        Intent::SubRej,
        Some("room:1".to_string()),
        json!({"reason": "unauthorized"}),
    ))
    .await;

    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::Rejected(json!({"reason": "unauthorized"}))
    );
    assert!(!channel.subscribed().await);

    // no automatic retry goes out
    sleep(Duration::from_millis(150)).await;
    assert!(conn.try_recv().is_none());
}

#[tokio::test]
async fn close_round_trip_waits_for_acknowledgement() {
    let (_server, mut conn, client) = connected_client(options()).await;

    let channel = client.subscribe("room:1", Default::default()).await.unwrap();
    assert_eq!(conn.recv().await.intent, Intent::SubReq);
    conn.send(WireMessage::new(
        Intent::SubAck,
        Some("room:1".to_string()),
        json!({}),
    ))
    .await;

    // wait until the ack landed, then observe: the next event is WillClose
    timeout(Duration::from_secs(5), async {
        while !channel.subscribed().await {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    let mut events = channel.events().await;

    channel.close().await.unwrap();
    assert_eq!(next_event(&mut events).await, ChannelEvent::WillClose);
    assert_eq!(conn.recv().await.intent, Intent::UnsReq);

    // still subscribed until the server acknowledges
    assert!(channel.subscribed().await);

    conn.send(WireMessage::new(
        Intent::UnsAck,
        Some("room:1".to_string()),
        json!({}),
    ))
    .await;
    assert_eq!(next_event(&mut events).await, ChannelEvent::DidClose);
    assert!(!channel.subscribed().await);
}

#[tokio::test]
async fn open_is_idempotent_while_subscribed() {
    let (_server, mut conn, client) = connected_client(options()).await;

    let channel = client.subscribe("room:1", Default::default()).await.unwrap();
    assert_eq!(conn.recv().await.intent, Intent::SubReq);
    conn.send(WireMessage::new(
        Intent::SubAck,
        Some("room:1".to_string()),
        json!({}),
    ))
    .await;

    timeout(Duration::from_secs(5), async {
        while !channel.subscribed().await {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    channel.open().await.unwrap();
    client.subscribe("room:1", Default::default()).await.unwrap();

    sleep(Duration::from_millis(150)).await;
    assert!(conn.try_recv().is_none());
}

#[tokio::test]
async fn channel_auth_override_rides_in_sub_req() {
    let (_server, mut conn, client) = connected_client(options()).await;

    client
        .subscribe(
            "vip:1",
            ChannelOptions {
                auth: Some(json!("room-key")),
            },
        )
        .await
        .unwrap();

    let sub = conn.recv().await;
    assert_eq!(sub.intent, Intent::SubReq);
    assert_eq!(sub.payload["auth"], json!("room-key"));
}

#[tokio::test]
async fn pushes_fan_out_to_named_and_generic_observers() {
    let (_server, mut conn, client) = connected_client(options()).await;

    let channel = client.subscribe("room:1", Default::default()).await.unwrap();
    assert_eq!(conn.recv().await.intent, Intent::SubReq);

    let mut named = channel.on("new_message").await;
    let mut other = channel.on("typing").await;
    let mut events = channel.events().await;

    conn.send(WireMessage::new(
        Intent::Msg,
        Some("room:1".to_string()),
        json!({"event": "new_message", "data": {"text": "hi"}, "sender": {"id": "u2"}}),
    ))
    .await;

    let data = timeout(Duration::from_secs(5), named.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(data, json!({"text": "hi"}));

    match next_event(&mut events).await {
        ChannelEvent::Message(push) => {
            assert_eq!(push.event.as_deref(), Some("new_message"));
            assert_eq!(push.data, json!({"text": "hi"}));
            assert_eq!(push.sender, Some(json!({"id": "u2"})));
        }
        other => panic!("expected Message, got {other:?}"),
    }

    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn publish_round_trip_reports_result() {
    let (_server, mut conn, client) = connected_client(options()).await;

    let channel = client.channel("room:1", Default::default()).await;
    let mut events = channel.events().await;

    channel
        .publish("new_message", json!({"text": "hello"}))
        .await
        .unwrap();

    let publish = conn.recv().await;
    assert_eq!(publish.intent, Intent::PubReq);
    assert_eq!(publish.payload["event"], json!("new_message"));
    assert_eq!(publish.payload["data"], json!({"text": "hello"}));

    conn.send(WireMessage::new(
        Intent::PubAck,
        Some("room:1".to_string()),
        json!({}),
    ))
    .await;
    assert_eq!(next_event(&mut events).await, ChannelEvent::PublishAck(json!({})));
}
