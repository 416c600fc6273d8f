//! # Relay Hub
//!
//! Real-time WebSocket relay. Clients attach under a unique name and exchange
//! text envelopes, either addressed to one peer or broadcast to every other
//! connected client. The hub announces connects and disconnects so clients
//! can track presence.
//!
//! ## Modules
//!
//! - [`relay`]: Envelope codec, session registry, lifecycle and routing
//! - [`server`]: Axum server exposing the relay endpoint
//! - [`config`]: TOML configuration with environment overrides
//! - [`logging`]: tracing-subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_hub::config::Config;
//! use relay_hub::server::{serve, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     relay_hub::logging::init_logging(&config.logging);
//!
//!     let state = AppState::new(config.server.clone());
//!     serve(state, &config.server).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod relay;
pub mod server;

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig};

pub use relay::{
    ClientConnection, ConnectionHandle, ErrorCode, LifecycleManager, MessageEnvelope,
    MessageRouter, RelayError, RelayHub, RouteOutcome, SessionRegistry, SessionState,
    TransportError,
};

pub use server::{build_router, serve, AppState, ServerError};
