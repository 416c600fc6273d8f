//! WebSocket Relay
//!
//! Named clients exchange text envelopes through the hub, either addressed
//! to one peer or broadcast to everyone else.
//!
//! ## Architecture
//!
//! - **Envelope**: lenient wire codec for relay frames
//! - **SessionRegistry**: concurrent directory of admitted connections
//! - **LifecycleManager**: admission, removal and presence notices
//! - **MessageRouter**: unicast/broadcast delivery and error replies
//! - **RelayHub**: the three above, built once and shared
//! - **Handler**: axum WebSocket adapter
//!
//! ## Usage
//!
//! Clients connect to `/websocket/{clientId}` and send frames such as:
//!
//! ```text
//! {"destino":"bob","message":"hi"}     addressed to bob
//! {"message":"hello everyone"}         broadcast
//! ```
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8025/websocket/alice');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({destino: 'bob', message: 'hi'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('Received:', msg);
//! };
//! ```

mod connection;
mod envelope;
mod error;
mod handler;
mod hub;
mod lifecycle;
mod registry;
mod router;

pub use connection::{
    ClientConnection, ClientId, CloseReason, ConnectionHandle, CLOSE_POLICY_VIOLATION,
};
pub use envelope::{
    encode_error, encode_success, now_millis, ErrorCode, MessageEnvelope, DESTINATION_FIELD,
    KIND_CHAT, KIND_CLIENT_CONNECT, KIND_CLIENT_DISCONNECT, KIND_ERROR, KIND_SUCCESS,
};
pub use error::{RelayError, RelayResult, TransportError};
pub use handler::{websocket_handler, WsConnectionHandle};
pub use hub::RelayHub;
pub use lifecycle::{LifecycleManager, Session, SessionState};
pub use registry::{RegistrationReceipt, SessionRegistry};
pub use router::{FanoutReport, MessageRouter, RouteOutcome};
