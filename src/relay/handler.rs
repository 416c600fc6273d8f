//! WebSocket Handler
//!
//! Transport adapter: upgrades `/websocket/:client_id`, turns socket events
//! into lifecycle and router calls, and implements [`ConnectionHandle`] on
//! top of a per-connection outbound channel.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::connection::{ClientConnection, CloseReason, ConnectionHandle};
use super::error::TransportError;
use super::hub::RelayHub;
use super::lifecycle::Session;
use crate::server::AppState;

/// Frames queued for the socket writer
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close(CloseReason),
}

/// [`ConnectionHandle`] backed by the writer task's channel
pub struct WsConnectionHandle {
    tx: mpsc::UnboundedSender<Outbound>,
    open: AtomicBool,
}

impl WsConnectionHandle {
    fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            tx,
            open: AtomicBool::new(true),
        }
    }

    fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }
}

#[async_trait]
impl ConnectionHandle for WsConnectionHandle {
    async fn send_text(&self, text: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.tx
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    async fn close(&self, reason: CloseReason) {
        let _ = self.tx.send(Outbound::Close(reason));
        self.mark_closed();
    }
}

/// WebSocket upgrade handler
///
/// The path segment becomes the client's registry key for the lifetime of
/// the connection.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, client_id: String, hub: RelayHub) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let handle = Arc::new(WsConnectionHandle::new(tx));

    let conn_id_for_send = client_id.clone();

    // Task to forward queued frames to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                Outbound::Text(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            client_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Outbound::Close(reason) => {
                    let frame = CloseFrame {
                        code: reason.code,
                        reason: reason.reason.into(),
                    };
                    let _ = sender.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
        }
    });

    let mut session = hub.lifecycle().connect(&client_id, handle.clone()).await;

    match hub.lifecycle().connection(&session) {
        Some(conn) => {
            tokio::select! {
                _ = &mut send_task => {}
                _ = receive_frames(&hub, &session, &conn, &mut receiver) => {
                    send_task.abort();
                }
            }
        }
        None => {
            // Rejected: let the writer flush the error and close frame
            let _ = send_task.await;
        }
    }

    handle.mark_closed();
    hub.lifecycle().disconnect(&mut session).await;
}

/// Read frames until the peer closes or the socket fails
async fn receive_frames(
    hub: &RelayHub,
    session: &Session,
    conn: &ClientConnection,
    receiver: &mut SplitStream<WebSocket>,
) {
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                hub.router().route(conn, &text).await;
            }
            Ok(Message::Binary(_)) => {
                hub.router().reject_invalid(conn).await;
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(client_id = %session.client_id(), "Client requested close");
                break;
            }
            // Axum answers pings itself
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(e) => {
                hub.lifecycle().transport_error(session, &e);
                break;
            }
        }
    }
}
