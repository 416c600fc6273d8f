//! Connection handles
//!
//! The relay core never talks to a socket directly. Each live connection is
//! represented by a [`ConnectionHandle`] which the transport adapter
//! implements; tests use an in-memory recording handle instead.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::error::TransportError;

/// Client identifier taken from the connection path
pub type ClientId = String;

/// WebSocket close code for policy violations (RFC 6455)
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Close code plus human-readable reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    pub fn policy_violation(reason: impl Into<String>) -> Self {
        Self {
            code: CLOSE_POLICY_VIOLATION,
            reason: reason.into(),
        }
    }
}

/// Capabilities the relay needs from a transport connection
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    /// Queue a text frame for the peer
    async fn send_text(&self, text: String) -> Result<(), TransportError>;

    /// Whether the connection still accepts frames
    fn is_open(&self) -> bool;

    /// Close the connection with the given reason
    async fn close(&self, reason: CloseReason);
}

/// A registered client: its id plus the handle of its connection
#[derive(Clone)]
pub struct ClientConnection {
    id: ClientId,
    handle: Arc<dyn ConnectionHandle>,
}

impl ClientConnection {
    pub fn new(id: impl Into<ClientId>, handle: Arc<dyn ConnectionHandle>) -> Self {
        Self {
            id: id.into(),
            handle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    pub async fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.handle.send_text(text).await
    }

    pub async fn close(&self, reason: CloseReason) {
        self.handle.close(reason).await
    }
}

impl fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("open", &self.handle.is_open())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingHandle;
    use super::*;

    #[tokio::test]
    async fn test_client_connection_delegates_to_handle() {
        let handle = RecordingHandle::new();
        let conn = ClientConnection::new("alice", handle.clone());

        assert_eq!(conn.id(), "alice");
        assert!(conn.is_open());

        conn.send_text("hello".to_string()).await.unwrap();
        assert_eq!(handle.sent(), vec!["hello".to_string()]);

        conn.close(CloseReason::policy_violation("bye")).await;
        assert!(!conn.is_open());
        assert_eq!(handle.closed_with().unwrap().code, CLOSE_POLICY_VIOLATION);
        assert_eq!(
            conn.send_text("late".to_string()).await,
            Err(TransportError::Closed)
        );
    }
}
