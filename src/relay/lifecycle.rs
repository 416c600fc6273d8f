//! Connection Lifecycle Manager
//!
//! Drives each client through `Unregistered → Open → Closed` in response to
//! transport events, keeping the registry in sync and announcing presence
//! changes to the other clients.

use std::fmt;
use std::sync::Arc;

use super::connection::{ClientConnection, ClientId, CloseReason, ConnectionHandle};
use super::envelope::{
    encode_error, MessageEnvelope, KIND_CLIENT_CONNECT, KIND_CLIENT_DISCONNECT,
};
use super::error::RelayError;
use super::registry::{RegistrationReceipt, SessionRegistry};
use super::router::MessageRouter;

const CONNECTED_NOTICE: &str = "Client connected";
const DISCONNECTED_NOTICE: &str = "Client disconnected";
const DUPLICATE_CLOSE_REASON: &str = "Duplicate client id";

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unregistered,
    Open,
    Closed,
}

/// One transport connection as seen by the lifecycle manager
#[derive(Debug)]
pub struct Session {
    client_id: ClientId,
    state: SessionState,
    receipt: Option<RegistrationReceipt>,
}

impl Session {
    fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            state: SessionState::Unregistered,
            receipt: None,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Present only when the connection was admitted
    pub fn receipt(&self) -> Option<&RegistrationReceipt> {
        self.receipt.as_ref()
    }
}

/// Reacts to connect, disconnect and error events from the transport
pub struct LifecycleManager {
    registry: Arc<SessionRegistry>,
    router: Arc<MessageRouter>,
}

impl LifecycleManager {
    pub fn new(registry: Arc<SessionRegistry>, router: Arc<MessageRouter>) -> Self {
        Self { registry, router }
    }

    /// Handle a new connection claiming `client_id`
    ///
    /// On a duplicate id the new connection receives a `CLIENT_ID_EXISTS`
    /// error and is closed with a policy violation; the existing owner of the
    /// id is not touched. The returned session is then already `Closed`.
    pub async fn connect(&self, client_id: &str, handle: Arc<dyn ConnectionHandle>) -> Session {
        let mut session = Session::new(client_id);

        match self.registry.register(client_id, Arc::clone(&handle)) {
            Ok(receipt) => {
                session.state = SessionState::Open;
                session.receipt = Some(receipt);
                tracing::info!(client_id = %client_id, "Client connected");

                let notice =
                    MessageEnvelope::system(KIND_CLIENT_CONNECT, client_id, CONNECTED_NOTICE);
                self.router
                    .broadcast(&notice.encode_notice(), client_id)
                    .await;
            }
            Err(error) => {
                tracing::warn!(client_id = %client_id, error = %error, "Rejecting connection");
                self.reject(client_id, handle, error).await;
                session.state = SessionState::Closed;
            }
        }

        session
    }

    /// Handle the transport reporting that the connection has gone away
    ///
    /// Only an admitted session releases its id; a rejected duplicate closing
    /// must never evict the rightful owner.
    pub async fn disconnect(&self, session: &mut Session) {
        if session.state != SessionState::Open {
            session.state = SessionState::Closed;
            return;
        }

        self.registry.remove(&session.client_id);
        session.state = SessionState::Closed;
        tracing::info!(client_id = %session.client_id, "Client disconnected");

        let notice = MessageEnvelope::system(
            KIND_CLIENT_DISCONNECT,
            &session.client_id,
            DISCONNECTED_NOTICE,
        );
        self.router
            .broadcast(&notice.encode_notice(), &session.client_id)
            .await;
    }

    /// Handle a transport error; removal follows the subsequent disconnect
    pub fn transport_error(&self, session: &Session, error: &dyn fmt::Display) {
        tracing::error!(
            client_id = %session.client_id,
            state = ?session.state,
            error = %error,
            "Transport error"
        );
    }

    /// Registered connection for an open session
    pub fn connection(&self, session: &Session) -> Option<ClientConnection> {
        if session.is_open() {
            self.registry.lookup(&session.client_id)
        } else {
            None
        }
    }

    async fn reject(&self, client_id: &str, handle: Arc<dyn ConnectionHandle>, error: RelayError) {
        let candidate = ClientConnection::new(client_id, handle);
        if let Some(code) = error.code() {
            if let Err(e) = candidate
                .send_text(encode_error(code, &error.to_string()))
                .await
            {
                tracing::debug!(client_id = %client_id, error = %e, "Failed to send rejection");
            }
        }
        candidate
            .close(CloseReason::policy_violation(DUPLICATE_CLOSE_REASON))
            .await;
    }
}
