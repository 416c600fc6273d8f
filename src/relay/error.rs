//! Relay error types
//!
//! Every routing or admission failure is local and recoverable. The hub turns
//! each one into an `error` envelope for the affected client instead of
//! letting it reach the transport.

use thiserror::Error;

use super::envelope::ErrorCode;

/// Errors raised by the registry, lifecycle manager and router
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// A connection tried to claim an id that is already registered
    #[error("Client id already in use: {0}")]
    ClientIdConflict(String),

    /// Unicast target is not in the registry
    #[error("Destination client not found: {0}")]
    DestinationNotFound(String),

    /// Unicast target vanished or failed between validation and delivery
    #[error("Destination client disconnected: {0}")]
    DestinationDisconnected(String),

    /// Inbound frame could not be turned into an envelope
    #[error("Invalid message format")]
    InvalidMessageFormat,

    /// A single recipient of a broadcast could not be reached
    #[error("Failed to send to client {client_id}: {source}")]
    TransportSendFailure {
        client_id: String,
        #[source]
        source: TransportError,
    },
}

impl RelayError {
    /// Wire error code reported to clients, if this error is client-visible
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RelayError::ClientIdConflict(_) => Some(ErrorCode::ClientIdExists),
            RelayError::DestinationNotFound(_) => Some(ErrorCode::DestinationNotFound),
            RelayError::DestinationDisconnected(_) => Some(ErrorCode::DestinationDisconnected),
            RelayError::InvalidMessageFormat => Some(ErrorCode::InvalidMessage),
            RelayError::TransportSendFailure { .. } => None,
        }
    }
}

/// Failures of a single connection handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection is already closed
    #[error("Connection closed")]
    Closed,

    /// The underlying socket rejected the frame
    #[error("Send failed: {0}")]
    Send(String),
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
