//! Envelope Codec
//!
//! Converts between the wire text of a relay frame and [`MessageEnvelope`].
//!
//! Decoding is a lenient scan rather than a JSON parse: each field is looked
//! up on its own by searching for `"<key>":"` and reading up to the next `"`.
//! Missing or malformed fields fall back to defaults and decoding never fails.
//! A value that itself contains a `"` is truncated at that quote.
//!
//! Encoding interpolates values into fixed templates without escaping, so the
//! output stays readable by the same lenient scanner on the client side.

use std::fmt;

/// Wire name of the destination field
pub const DESTINATION_FIELD: &str = "destino";

/// Default envelope type for client traffic
pub const KIND_CHAT: &str = "chat";
/// System notice emitted when a client is admitted
pub const KIND_CLIENT_CONNECT: &str = "client_connect";
/// System notice emitted when a client leaves
pub const KIND_CLIENT_DISCONNECT: &str = "client_disconnect";
/// Error reply sent to a single client
pub const KIND_ERROR: &str = "error";
/// Success acknowledgement
pub const KIND_SUCCESS: &str = "success";

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A single relay message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    /// Semantic category (`chat`, `client_connect`, ...). Empty means unset.
    pub kind: String,
    /// Originating client id
    pub sender: String,
    /// Target client id; `None` means broadcast
    pub destination: Option<String>,
    /// Free-form payload
    pub message: String,
    /// Creation time in epoch milliseconds
    pub timestamp: i64,
}

impl MessageEnvelope {
    /// Decode wire text, defaulting every field that is absent or unreadable
    pub fn decode(raw: &str) -> Self {
        Self {
            kind: extract_str(raw, "type").unwrap_or_default().to_string(),
            sender: extract_str(raw, "sender").unwrap_or_default().to_string(),
            destination: extract_str(raw, DESTINATION_FIELD)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            message: extract_str(raw, "message").unwrap_or_default().to_string(),
            timestamp: extract_timestamp(raw).unwrap_or_else(now_millis),
        }
    }

    /// Build a hub-generated notice about `subject`, stamped with the current time
    pub fn system(kind: &str, subject: &str, message: &str) -> Self {
        Self {
            kind: kind.to_string(),
            sender: subject.to_string(),
            destination: None,
            message: message.to_string(),
            timestamp: now_millis(),
        }
    }

    /// Envelope type, falling back to `chat` when unset
    pub fn kind_or_default(&self) -> &str {
        if self.kind.is_empty() {
            KIND_CHAT
        } else {
            &self.kind
        }
    }

    /// True when the envelope has no destination
    pub fn is_broadcast(&self) -> bool {
        self.destination.is_none()
    }

    /// Replace the sender with a verified connection id
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Addressed form: `type`, `sender`, `destino`, `message`, `timestamp`
    pub fn encode(&self) -> String {
        format!(
            "{{\"type\":\"{}\",\"sender\":\"{}\",\"{}\":\"{}\",\"message\":\"{}\",\"timestamp\":{}}}",
            self.kind_or_default(),
            self.sender,
            DESTINATION_FIELD,
            self.destination.as_deref().unwrap_or_default(),
            self.message,
            self.timestamp
        )
    }

    /// Notice form without a destination: `type`, `sender`, `message`, `timestamp`
    pub fn encode_notice(&self) -> String {
        format!(
            "{{\"type\":\"{}\",\"sender\":\"{}\",\"message\":\"{}\",\"timestamp\":{}}}",
            self.kind_or_default(),
            self.sender,
            self.message,
            self.timestamp
        )
    }
}

/// Error codes carried in `error` envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ClientIdExists,
    DestinationNotFound,
    InvalidMessage,
    DestinationDisconnected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ClientIdExists => "CLIENT_ID_EXISTS",
            ErrorCode::DestinationNotFound => "DESTINATION_NOT_FOUND",
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::DestinationDisconnected => "DESTINATION_DISCONNECTED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode an `error` envelope stamped with the current time
pub fn encode_error(code: ErrorCode, message: &str) -> String {
    format!(
        "{{\"type\":\"{}\",\"errorCode\":\"{}\",\"message\":\"{}\",\"timestamp\":{}}}",
        KIND_ERROR,
        code,
        message,
        now_millis()
    )
}

/// Encode a `success` envelope stamped with the current time
pub fn encode_success(status: &str, message: &str) -> String {
    format!(
        "{{\"type\":\"{}\",\"status\":\"{}\",\"message\":\"{}\",\"timestamp\":{}}}",
        KIND_SUCCESS,
        status,
        message,
        now_millis()
    )
}

/// Value of `"<key>":"...`, up to the next quote
fn extract_str<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("\"{}\":\"", key);
    let start = raw.find(&pattern)? + pattern.len();
    let rest = &raw[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Timestamp in either the numeric or the quoted form
fn extract_timestamp(raw: &str) -> Option<i64> {
    const PATTERN: &str = "\"timestamp\":";
    let start = raw.find(PATTERN)? + PATTERN.len();
    let rest = raw[start..].trim_start();
    let token = match rest.strip_prefix('"') {
        Some(quoted) => &quoted[..quoted.find('"')?],
        None => {
            let end = rest
                .find(|c: char| c == ',' || c == '}' || c.is_whitespace())
                .unwrap_or(rest.len());
            &rest[..end]
        }
    };
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_envelope() {
        let raw = r#"{"type":"chat","sender":"alice","destino":"bob","message":"hi","timestamp":1699000000000}"#;
        let env = MessageEnvelope::decode(raw);

        assert_eq!(env.kind, "chat");
        assert_eq!(env.sender, "alice");
        assert_eq!(env.destination.as_deref(), Some("bob"));
        assert_eq!(env.message, "hi");
        assert_eq!(env.timestamp, 1699000000000);
    }

    #[test]
    fn test_decode_missing_fields_uses_defaults() {
        let before = now_millis();
        let env = MessageEnvelope::decode(r#"{"message":"hello"}"#);
        let after = now_millis();

        assert_eq!(env.kind, "");
        assert_eq!(env.kind_or_default(), KIND_CHAT);
        assert_eq!(env.sender, "");
        assert!(env.is_broadcast());
        assert_eq!(env.message, "hello");
        assert!(env.timestamp >= before && env.timestamp <= after);
    }

    #[test]
    fn test_decode_garbage_never_fails() {
        for raw in ["", "not json at all", "{", r#"{"type":"#, r#"{"message":"unterminated"#] {
            let env = MessageEnvelope::decode(raw);
            assert_eq!(env.message, "");
            assert!(env.is_broadcast());
            assert!(env.timestamp > 0);
        }
    }

    #[test]
    fn test_decode_empty_destination_is_broadcast() {
        let env = MessageEnvelope::decode(r#"{"destino":"","message":"all"}"#);
        assert!(env.is_broadcast());
    }

    #[test]
    fn test_decode_truncates_at_embedded_quote() {
        let env = MessageEnvelope::decode(r#"{"message":"say \"hi\" now"}"#);
        assert_eq!(env.message, r"say \");
    }

    #[test]
    fn test_decode_spaced_key_is_not_matched() {
        let env = MessageEnvelope::decode(r#"{"type": "chat", "message":"x"}"#);
        assert_eq!(env.kind, "");
        assert_eq!(env.message, "x");
    }

    #[test]
    fn test_decode_timestamp_forms() {
        let quoted = MessageEnvelope::decode(r#"{"timestamp":"1234"}"#);
        assert_eq!(quoted.timestamp, 1234);

        let spaced = MessageEnvelope::decode(r#"{"timestamp": 42}"#);
        assert_eq!(spaced.timestamp, 42);

        let before = now_millis();
        let bogus = MessageEnvelope::decode(r#"{"timestamp":"yesterday"}"#);
        assert!(bogus.timestamp >= before);

        // The whole token must parse, not just its leading digits
        for raw in [
            r#"{"timestamp":"1234abc"}"#,
            r#"{"timestamp":"7 days"}"#,
            r#"{"timestamp":12.5e9}"#,
        ] {
            let decoded = MessageEnvelope::decode(raw);
            assert!(decoded.timestamp >= before, "{raw} decoded to {}", decoded.timestamp);
        }
    }

    #[test]
    fn test_encode_unicast() {
        let env = MessageEnvelope {
            kind: String::new(),
            sender: "alice".to_string(),
            destination: Some("bob".to_string()),
            message: "hi".to_string(),
            timestamp: 1,
        };
        assert_eq!(
            env.encode(),
            r#"{"type":"chat","sender":"alice","destino":"bob","message":"hi","timestamp":1}"#
        );
    }

    #[test]
    fn test_encode_notice_omits_destination() {
        let mut env = MessageEnvelope::system(KIND_CLIENT_CONNECT, "bob", "Client connected");
        env.timestamp = 7;
        assert_eq!(
            env.encode_notice(),
            r#"{"type":"client_connect","sender":"bob","message":"Client connected","timestamp":7}"#
        );
    }

    #[test]
    fn test_encoded_unicast_is_readable_by_decoder() {
        let env = MessageEnvelope::decode(r#"{"destino":"bob","message":"ping","timestamp":5}"#)
            .with_sender("alice");
        let decoded = MessageEnvelope::decode(&env.encode());
        assert_eq!(decoded.sender, "alice");
        assert_eq!(decoded.kind, KIND_CHAT);
        assert_eq!(decoded, MessageEnvelope { kind: KIND_CHAT.to_string(), ..env });
    }

    #[test]
    fn test_encode_error_and_success() {
        let err = encode_error(ErrorCode::DestinationNotFound, "Destination client not found: carol");
        assert!(err.starts_with(r#"{"type":"error","errorCode":"DESTINATION_NOT_FOUND","message":"Destination client not found: carol","timestamp":"#));
        assert!(err.ends_with('}'));

        let ok = encode_success("ok", "done");
        assert!(ok.starts_with(r#"{"type":"success","status":"ok","message":"done","timestamp":"#));
    }

    #[test]
    fn test_error_code_strings() {
        assert_eq!(ErrorCode::ClientIdExists.to_string(), "CLIENT_ID_EXISTS");
        assert_eq!(ErrorCode::DestinationNotFound.to_string(), "DESTINATION_NOT_FOUND");
        assert_eq!(ErrorCode::InvalidMessage.to_string(), "INVALID_MESSAGE");
        assert_eq!(
            ErrorCode::DestinationDisconnected.to_string(),
            "DESTINATION_DISCONNECTED"
        );
    }
}
