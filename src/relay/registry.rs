//! Session Registry
//!
//! Concurrent directory of live connections keyed by client id.
//! Backed by a `DashMap`, so admission is an atomic insert-if-absent on the
//! key's shard and no lock is ever held while a frame is being sent: every
//! read hands out a cloned [`ClientConnection`].

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::connection::{ClientConnection, ClientId, ConnectionHandle};
use super::envelope::now_millis;
use super::error::{RelayError, RelayResult};

/// Proof of a successful admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub client_id: ClientId,
    /// Admission time in epoch milliseconds
    pub registered_at: i64,
}

/// Directory of admitted connections
#[derive(Default)]
pub struct SessionRegistry {
    entries: DashMap<ClientId, ClientConnection>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection under `id`
    ///
    /// Fails with [`RelayError::ClientIdConflict`] if the id is taken; the
    /// existing entry is left untouched.
    pub fn register(
        &self,
        id: &str,
        handle: Arc<dyn ConnectionHandle>,
    ) -> RelayResult<RegistrationReceipt> {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(_) => Err(RelayError::ClientIdConflict(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(ClientConnection::new(id, handle));
                Ok(RegistrationReceipt {
                    client_id: id.to_string(),
                    registered_at: now_millis(),
                })
            }
        }
    }

    /// Remove `id` if present
    pub fn remove(&self, id: &str) -> Option<ClientConnection> {
        self.entries.remove(id).map(|(_, conn)| conn)
    }

    pub fn lookup(&self, id: &str) -> Option<ClientConnection> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point-in-time list of open connections
    ///
    /// Shard locks are only held while copying; mutations racing with the
    /// scan are either included or not, but no entry appears twice.
    pub fn snapshot(&self) -> Vec<ClientConnection> {
        self.entries
            .iter()
            .filter(|entry| entry.value().is_open())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Ids of all open connections, sorted
    pub fn snapshot_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .snapshot()
            .into_iter()
            .map(|conn| conn.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// Visit every open connection from a snapshot
    pub fn for_each_open<F>(&self, mut f: F)
    where
        F: FnMut(&ClientConnection),
    {
        for conn in self.snapshot() {
            f(&conn);
        }
    }
}
