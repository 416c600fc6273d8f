//! Server Error Types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while starting or running the server
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Binding or serving failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;
