//! Message Router
//!
//! Decides what happens to each inbound text frame:
//!
//! ```text
//! raw text ─ decode ─┬─ destino set ── registered? ──no──▶ DESTINATION_NOT_FOUND
//!                    │                     │yes
//!                    │                     ▼
//!                    │             re-encode + send ──fail──▶ DESTINATION_DISCONNECTED
//!                    │
//!                    └─ no destino ─▶ raw text to every other open client
//! ```
//!
//! Unicast messages are re-encoded with the verified sender id. Broadcasts
//! forward the sender's raw text untouched.

use futures_util::future::join_all;
use std::sync::Arc;

use super::connection::ClientConnection;
use super::envelope::{encode_error, MessageEnvelope};
use super::error::RelayError;
use super::registry::SessionRegistry;

/// Result of a broadcast fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Recipients the frame was handed to
    pub delivered: usize,
    /// Recipients whose send failed
    pub failed: usize,
}

/// What the router did with one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Unicast handed to the destination
    Delivered { destination: String },
    /// Broadcast fanned out to the other clients
    Broadcast(FanoutReport),
    /// Frame was answered with an error envelope instead of being delivered
    Rejected(RelayError),
}

/// Routes frames between registered clients
pub struct MessageRouter {
    registry: Arc<SessionRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Route a text frame received from `sender`
    pub async fn route(&self, sender: &ClientConnection, raw: &str) -> RouteOutcome {
        tracing::debug!(client_id = %sender.id(), text = %raw, "Received message");

        // Decoding never fails, so text frames are always routed. Only
        // uninterpretable frames reach `reject_invalid`.
        let envelope = MessageEnvelope::decode(raw);

        match envelope.destination.clone() {
            Some(destination) => self.unicast(sender, envelope, destination).await,
            None => RouteOutcome::Broadcast(self.broadcast(raw, sender.id()).await),
        }
    }

    /// Answer a frame that could not be interpreted at all
    pub async fn reject_invalid(&self, sender: &ClientConnection) -> RouteOutcome {
        self.reject(sender, RelayError::InvalidMessageFormat).await
    }

    async fn unicast(
        &self,
        sender: &ClientConnection,
        envelope: MessageEnvelope,
        destination: String,
    ) -> RouteOutcome {
        if !self.registry.contains(&destination) {
            return self
                .reject(sender, RelayError::DestinationNotFound(destination))
                .await;
        }

        // The destination may have left since the check above
        let target = match self.registry.lookup(&destination) {
            Some(target) if target.is_open() => target,
            _ => {
                return self
                    .reject(sender, RelayError::DestinationDisconnected(destination))
                    .await;
            }
        };

        let text = envelope.with_sender(sender.id()).encode();
        match target.send_text(text).await {
            Ok(()) => {
                tracing::debug!(
                    sender = %sender.id(),
                    destination = %destination,
                    "Delivered message"
                );
                RouteOutcome::Delivered { destination }
            }
            Err(e) => {
                tracing::warn!(
                    destination = %destination,
                    error = %e,
                    "Failed to deliver message"
                );
                self.reject(sender, RelayError::DestinationDisconnected(destination))
                    .await
            }
        }
    }

    /// Send `text` to every open client except `exclude`
    ///
    /// Recipients are served concurrently; a failed recipient is logged and
    /// does not affect the others.
    pub async fn broadcast(&self, text: &str, exclude: &str) -> FanoutReport {
        let recipients: Vec<ClientConnection> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|conn| conn.id() != exclude)
            .collect();

        let results = join_all(recipients.iter().map(|conn| async move {
            conn.send_text(text.to_string())
                .await
                .map_err(|source| RelayError::TransportSendFailure {
                    client_id: conn.id().to_string(),
                    source,
                })
        }))
        .await;

        let mut report = FanoutReport::default();
        for result in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "Broadcast recipient unreachable");
                    report.failed += 1;
                }
            }
        }

        if report.delivered > 0 {
            tracing::trace!(
                exclude = %exclude,
                recipients = report.delivered,
                "Broadcast message"
            );
        }

        report
    }

    /// Tell `sender` about `error` and report the frame as rejected
    async fn reject(&self, sender: &ClientConnection, error: RelayError) -> RouteOutcome {
        if let Some(code) = error.code() {
            if sender.is_open() {
                if let Err(e) = sender.send_text(encode_error(code, &error.to_string())).await {
                    tracing::debug!(
                        client_id = %sender.id(),
                        error = %e,
                        "Failed to send error envelope"
                    );
                }
            }
        }
        RouteOutcome::Rejected(error)
    }
}
