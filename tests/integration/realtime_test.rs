//! Real-time session integration tests

use serde_json::json;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

use crate::common::MockChatServer;
use crate::{assert_contains, assert_event};
use chathub::shared::{HubConfig, PresenceStatus};

const QUIET: Duration = Duration::from_millis(200);

fn fast_config() -> HubConfig {
    HubConfig::builder()
        .heartbeat_interval(Duration::from_secs(5))
        .read_timeout(Duration::from_secs(30))
        .build()
        .expect("valid hub config")
}

#[tokio::test]
async fn test_presence_is_announced_to_everyone() {
    let server = MockChatServer::start(fast_config()).await;

    let mut alice = server.connect(1).await;
    let mut bob = server.connect(2).await;

    let seen_by_alice = alice.next_event().await;
    assert_event!(seen_by_alice, "status_change", "user_id" => 2, "status" => "online");

    let snapshot = server.hub.snapshot().await.expect("hub is running");
    assert_eq!(snapshot.session_count(), 2);
    assert!(snapshot.is_consistent());

    bob.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_message_reaches_participants_only() {
    let server = MockChatServer::start(fast_config()).await;
    server.gateway.add_conversation(7, [1, 2]);

    let mut alice = server.connect(1).await;
    let mut bob = server.connect(2).await;
    let mut carol = server.connect(3).await;
    alice.wait_for(|e| e["user_id"] == 3).await;
    bob.wait_for(|e| e["user_id"] == 3).await;

    alice
        .send_json(json!({"type": "message", "conversation_id": 7, "content": "hello bob"}))
        .await;

    for client in [&mut alice, &mut bob] {
        let event = client.next_event().await;
        assert_event!(event, "new_message");
        assert_eq!(event["message"]["content"], "hello bob");
        assert_eq!(event["message"]["sender_id"], 1);
        assert_eq!(event["message"]["conversation_id"], 7);
    }
    carol.expect_silence(QUIET).await;

    let stored = server.gateway.messages();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "hello bob");
}

#[tokio::test]
async fn test_typing_skips_the_sender() {
    let server = MockChatServer::start(fast_config()).await;
    server.gateway.add_conversation(4, [1, 2]);

    let mut alice = server.connect(1).await;
    let mut bob = server.connect(2).await;
    alice.wait_for(|e| e["user_id"] == 2).await;

    alice
        .send_json(json!({"type": "typing", "conversation_id": 4}))
        .await;

    let event = bob.next_event().await;
    assert_event!(event, "typing", "conversation_id" => 4, "user_id" => 1);
    alice.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_outsider_message_is_dropped() {
    let server = MockChatServer::start(fast_config()).await;
    server.gateway.add_conversation(4, [1, 2]);

    let mut alice = server.connect(1).await;
    let mut mallory = server.connect(9).await;
    alice.wait_for(|e| e["user_id"] == 9).await;

    mallory
        .send_json(json!({"type": "message", "conversation_id": 4, "content": "let me in"}))
        .await;

    alice.expect_silence(QUIET).await;
    mallory.expect_silence(QUIET).await;
    assert!(server.gateway.messages().is_empty());
}

#[tokio::test]
async fn test_bad_frames_keep_the_session_open() {
    let server = MockChatServer::start(fast_config()).await;
    server.gateway.add_conversation(1, [1]);

    let mut alice = server.connect(1).await;
    alice.send_text("not json at all").await;
    alice.send_text(r#"["message", 1, "smuggled"]"#).await;
    alice.send_json(json!({"type": "message", "content": "no conversation"})).await;
    alice.send_json(json!({"type": "reaction", "conversation_id": 1})).await;
    alice
        .send_json(json!({"type": "message", "conversation_id": 1, "content": "still here"}))
        .await;

    let event = alice.next_event().await;
    assert_event!(event, "new_message");
    assert_eq!(event["message"]["content"], "still here");
    assert_eq!(server.gateway.messages().len(), 1);
}

#[tokio::test]
async fn test_disconnect_announces_offline_and_persists_presence() {
    let server = MockChatServer::start(fast_config()).await;

    let mut alice = server.connect(1).await;
    let bob = server.connect(2).await;
    alice.wait_for(|e| e["user_id"] == 2).await;

    bob.close().await;

    let event = alice.next_event().await;
    assert_event!(event, "status_change", "user_id" => 2, "status" => "offline");

    let mut persisted = false;
    for _ in 0..50 {
        if server
            .gateway
            .presence_log()
            .contains(&(2, PresenceStatus::Offline))
        {
            persisted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(persisted, "offline status was never written");

    let snapshot = server.hub.snapshot().await.expect("hub is running");
    assert_eq!(snapshot.session_count(), 1);
}

#[tokio::test]
async fn test_server_sends_heartbeat_pings() {
    let config = HubConfig::builder()
        .heartbeat_interval(Duration::from_millis(100))
        .read_timeout(Duration::from_secs(5))
        .build()
        .expect("valid hub config");
    let server = MockChatServer::start(config).await;
    let mut alice = server.connect_raw(1).await;

    let mut saw_ping = false;
    for _ in 0..10 {
        match alice.next_frame(Duration::from_secs(2)).await {
            Some(Message::Ping(_)) => {
                saw_ping = true;
                break;
            }
            Some(_) => continue,
            None => break,
        }
    }
    assert!(saw_ping, "no ping frame received");
}

#[tokio::test]
async fn test_silent_client_is_timed_out() {
    let config = HubConfig::builder()
        .heartbeat_interval(Duration::from_millis(100))
        .read_timeout(Duration::from_millis(400))
        .build()
        .expect("valid hub config");
    let server = MockChatServer::start(config).await;

    // Never read from, so it never answers a ping.
    let mut idle = server.connect_raw(2).await;
    let mut alice = server.connect(1).await;

    let event = alice
        .wait_for(|e| e["user_id"] == 2 && e["status"] == "offline")
        .await;
    assert_contains!(event.to_string(), "offline");
    idle.expect_closed(Duration::from_secs(5)).await;
}
