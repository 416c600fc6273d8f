//! End-to-end relay tests over real WebSocket connections

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use relay_hub::config::ServerConfig;
use relay_hub::server::{build_router, AppState};
use relay_hub::MessageEnvelope;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> (String, AppState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(ServerConfig::new("127.0.0.1", addr.port()));
    let router = build_router(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("ws://{}", addr), state)
}

async fn connect(base: &str, id: &str) -> Client {
    let (ws, _) = connect_async(format!("{}/websocket/{}", base, id))
        .await
        .unwrap();
    ws
}

/// Registration happens after the upgrade completes, so wait for it
async fn wait_for_clients(state: &AppState, expected: usize) {
    for _ in 0..200 {
        if state.connection_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} clients, have {}",
        expected,
        state.connection_count()
    );
}

async fn next_message(ws: &mut Client) -> Message {
    tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection ended")
        .unwrap()
}

async fn next_text(ws: &mut Client) -> String {
    loop {
        match next_message(ws).await {
            Message::Text(text) => return text,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

async fn assert_silent(ws: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {:?}", result);
}

async fn send(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_connect_notice_and_unicast() {
    let (base, state) = start_server().await;

    let mut alice = connect(&base, "alice").await;
    wait_for_clients(&state, 1).await;
    let mut bob = connect(&base, "bob").await;
    wait_for_clients(&state, 2).await;

    let notice = MessageEnvelope::decode(&next_text(&mut alice).await);
    assert_eq!(notice.kind, "client_connect");
    assert_eq!(notice.sender, "bob");

    send(&mut alice, r#"{"destino":"bob","message":"hi"}"#).await;

    let received = MessageEnvelope::decode(&next_text(&mut bob).await);
    assert_eq!(received.sender, "alice");
    assert_eq!(received.message, "hi");
    assert_eq!(received.destination.as_deref(), Some("bob"));
    assert_eq!(received.kind, "chat");

    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_unknown_destination() {
    let (base, state) = start_server().await;

    let mut alice = connect(&base, "alice").await;
    wait_for_clients(&state, 1).await;

    send(&mut alice, r#"{"destino":"carol","message":"hi"}"#).await;

    let reply = next_text(&mut alice).await;
    assert!(reply.starts_with(r#"{"type":"error","errorCode":"DESTINATION_NOT_FOUND""#));
    assert!(reply.contains("carol"));
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_duplicate_id_rejected() {
    let (base, state) = start_server().await;

    let mut first = connect(&base, "x").await;
    wait_for_clients(&state, 1).await;

    let mut second = connect(&base, "x").await;

    let reply = next_text(&mut second).await;
    assert!(reply.contains(r#""errorCode":"CLIENT_ID_EXISTS""#));

    match next_message(&mut second).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Policy);
            assert!(!frame.reason.is_empty());
        }
        other => panic!("expected close frame, got {:?}", other),
    }

    // The original owner keeps the id and hears nothing
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(state.connection_count(), 1);
    assert_eq!(state.hub.connected_clients(), vec!["x"]);
    assert_silent(&mut first).await;
}

#[tokio::test]
async fn test_broadcast_reaches_everyone_else_verbatim() {
    let (base, state) = start_server().await;

    let mut alice = connect(&base, "alice").await;
    wait_for_clients(&state, 1).await;
    let mut bob = connect(&base, "bob").await;
    wait_for_clients(&state, 2).await;
    let mut carol = connect(&base, "carol").await;
    wait_for_clients(&state, 3).await;

    // Drain presence notices
    next_text(&mut alice).await;
    next_text(&mut alice).await;
    next_text(&mut bob).await;

    let raw = r#"{"type":"chat","sender":"anyone","message":"hello all"}"#;
    send(&mut alice, raw).await;

    assert_eq!(next_text(&mut bob).await, raw);
    assert_eq!(next_text(&mut carol).await, raw);
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_disconnect_notice() {
    let (base, state) = start_server().await;

    let mut alice = connect(&base, "alice").await;
    wait_for_clients(&state, 1).await;
    let mut bob = connect(&base, "bob").await;
    wait_for_clients(&state, 2).await;
    next_text(&mut alice).await;

    bob.close(None).await.unwrap();

    let notice = MessageEnvelope::decode(&next_text(&mut alice).await);
    assert_eq!(notice.kind, "client_disconnect");
    assert_eq!(notice.sender, "bob");
    wait_for_clients(&state, 1).await;

    // The id is free again
    let _bob_again = connect(&base, "bob").await;
    wait_for_clients(&state, 2).await;
}

#[tokio::test]
async fn test_binary_frame_is_invalid() {
    let (base, state) = start_server().await;

    let mut alice = connect(&base, "alice").await;
    wait_for_clients(&state, 1).await;

    alice.send(Message::Binary(vec![1, 2, 3])).await.unwrap();

    let reply = next_text(&mut alice).await;
    assert!(reply.contains(r#""errorCode":"INVALID_MESSAGE""#));
}
