//! Presence Routes
//!
//! - GET /clients - Ids of the clients currently connected

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::server::state::AppState;

/// Connected client listing
#[derive(Debug, Serialize)]
pub struct ClientsResponse {
    pub count: usize,
    /// Sorted client ids
    pub clients: Vec<String>,
}

/// GET /clients
pub async fn list_clients(State(state): State<Arc<AppState>>) -> Json<ClientsResponse> {
    let clients = state.hub.connected_clients();
    tracing::debug!(clients = ?clients, "Connected clients");

    Json(ClientsResponse {
        count: clients.len(),
        clients,
    })
}
