//! In-process chat server for end-to-end session tests
//!
//! Serves real WebSocket sessions over a loopback socket, backed by
//! `MemoryGateway` instead of Postgres. Identity comes from a `user_id`
//! query parameter; authentication is covered by the router tests.

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chathub::backend::realtime::fanout::spawn_presence_writer;
use chathub::backend::realtime::{serve_socket, FanoutRouter, Hub, HubHandle, MemoryGateway};
use chathub::shared::messaging::UserId;
use chathub::shared::HubConfig;

/// How long a client waits for an expected frame
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct MockState {
    hub: HubHandle,
    fanout: FanoutRouter,
    config: HubConfig,
}

#[derive(Deserialize)]
struct Identity {
    user_id: UserId,
}

async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<MockState>,
    Query(identity): Query<Identity>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        serve_socket(socket, identity.user_id, state.hub, state.fanout, state.config).await;
    })
}

/// A running hub plus WebSocket endpoint on an ephemeral port
pub struct MockChatServer {
    pub addr: SocketAddr,
    pub gateway: Arc<MemoryGateway>,
    pub hub: HubHandle,
    task: JoinHandle<()>,
}

impl MockChatServer {
    pub async fn start(config: HubConfig) -> Self {
        let gateway = Arc::new(MemoryGateway::new());
        let presence = spawn_presence_writer(gateway.clone());
        let hub = Hub::spawn(Some(presence));
        let fanout = FanoutRouter::new(gateway.clone(), hub.clone());

        let app = Router::new().route("/ws", get(upgrade)).with_state(MockState {
            hub: hub.clone(),
            fanout,
            config,
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            gateway,
            hub,
            task,
        }
    }

    /// Connect without waiting for registration
    pub async fn connect_raw(&self, user_id: UserId) -> TestClient {
        let url = format!("ws://{}/ws?user_id={}", self.addr, user_id);
        let (socket, _) = connect_async(url).await.expect("websocket handshake");
        TestClient { user_id, socket }
    }

    /// Connect and wait for the client's own online announcement
    pub async fn connect(&self, user_id: UserId) -> TestClient {
        let mut client = self.connect_raw(user_id).await;
        client
            .wait_for(|event| {
                event["type"] == "status_change"
                    && event["user_id"] == user_id
                    && event["status"] == "online"
            })
            .await;
        client
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// WebSocket client side of a session
pub struct TestClient {
    pub user_id: UserId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn send_json(&mut self, value: serde_json::Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.socket
            .send(Message::Text(text.into()))
            .await
            .expect("send text frame");
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }

    /// Next raw frame, or `None` once the server has gone away
    pub async fn next_frame(&mut self, within: Duration) -> Option<Message> {
        match tokio::time::timeout(within, self.socket.next()).await {
            Ok(Some(Ok(frame))) => Some(frame),
            Ok(Some(Err(_))) | Ok(None) => None,
            Err(_) => panic!("user {}: no frame within {:?}", self.user_id, within),
        }
    }

    /// Next event, skipping control frames
    pub async fn next_event(&mut self) -> serde_json::Value {
        self.try_next_event(EVENT_TIMEOUT)
            .await
            .unwrap_or_else(|| panic!("user {}: no event within {:?}", self.user_id, EVENT_TIMEOUT))
    }

    /// Next event if one arrives in time
    pub async fn try_next_event(&mut self, within: Duration) -> Option<serde_json::Value> {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.socket.next()).await.ok()??;
            match frame {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(text.as_str()).expect("event is JSON"))
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Skip events until one matches
    pub async fn wait_for<F>(&mut self, matches: F) -> serde_json::Value
    where
        F: Fn(&serde_json::Value) -> bool,
    {
        let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let event = self
                .try_next_event(remaining)
                .await
                .unwrap_or_else(|| panic!("user {}: expected event never arrived", self.user_id));
            if matches(&event) {
                return event;
            }
        }
    }

    /// Assert that no event arrives for a while
    pub async fn expect_silence(&mut self, within: Duration) {
        if let Some(event) = self.try_next_event(within).await {
            panic!("user {}: unexpected event {}", self.user_id, event);
        }
    }

    /// Wait until the server ends the connection
    pub async fn expect_closed(&mut self, within: Duration) {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            match tokio::time::timeout_at(deadline, self.socket.next()).await {
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return,
                Ok(Some(Ok(_))) => continue,
                Err(_) => panic!("user {}: connection still open after {:?}", self.user_id, within),
            }
        }
    }
}
