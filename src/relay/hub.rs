//! Relay Hub
//!
//! Wires the registry, router and lifecycle manager together. One hub is
//! built at startup and shared through the application state.

use std::sync::Arc;

use super::connection::ClientId;
use super::lifecycle::LifecycleManager;
use super::registry::SessionRegistry;
use super::router::MessageRouter;

/// The relay core shared by every connection task
#[derive(Clone)]
pub struct RelayHub {
    registry: Arc<SessionRegistry>,
    router: Arc<MessageRouter>,
    lifecycle: Arc<LifecycleManager>,
}

impl RelayHub {
    pub fn new() -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let router = Arc::new(MessageRouter::new(Arc::clone(&registry)));
        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::clone(&registry),
            Arc::clone(&router),
        ));

        Self {
            registry,
            router,
            lifecycle,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Number of registered clients
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Sorted ids of the clients currently connected
    pub fn connected_clients(&self) -> Vec<ClientId> {
        self.registry.snapshot_ids()
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::connection::testing::RecordingHandle;

    #[tokio::test]
    async fn test_hub_components_share_registry() {
        let hub = RelayHub::new();
        let alice = RecordingHandle::new();
        let bob = RecordingHandle::new();

        hub.lifecycle().connect("bob", bob.clone()).await;
        let session = hub.lifecycle().connect("alice", alice.clone()).await;
        assert_eq!(hub.connection_count(), 2);
        assert_eq!(hub.connected_clients(), vec!["alice", "bob"]);

        let conn = hub.lifecycle().connection(&session).unwrap();
        hub.router()
            .route(&conn, r#"{"destino":"bob","message":"hi"}"#)
            .await;

        let last = bob.sent().pop().unwrap();
        assert!(last.contains(r#""sender":"alice""#));
        assert!(last.contains(r#""message":"hi""#));
    }
}
