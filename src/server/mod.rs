//! Relay HTTP Server
//!
//! HTTP layer for the relay hub, built with Axum.
//!
//! # Endpoints
//!
//! ## WebSocket
//! - `GET /websocket/:client_id` - Relay connection for `client_id`
//!
//! ## Presence
//! - `GET /clients` - Connected client ids
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Status with connection count
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_hub::config::ServerConfig;
//! use relay_hub::server::{serve, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     serve(AppState::new(config.clone()), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use state::AppState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::relay::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/websocket/:client_id", get(websocket_handler))
        .route("/clients", get(routes::clients::list_clients))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the relay server and run until a shutdown signal arrives
pub async fn serve(state: AppState, config: &ServerConfig) -> ServerResult<()> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Relay hub listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Relay hub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
