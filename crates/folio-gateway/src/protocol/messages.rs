//! Gateway message format
//!
//! Every frame in either direction is one JSON [`GatewayMessage`].

use super::{CloseCode, HelloPayload, IdentifyPayload, OpCode, SubscriptionPayload};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Gateway message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Per-connection sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    // === Server Messages ===

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(payload: HelloPayload) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    /// Create a Heartbeat ACK message (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            s: None,
            d: None,
        }
    }

    // === Parsing Client Messages ===

    /// Try to parse as an Identify payload (op=2)
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        self.payload_for(OpCode::Identify)
    }

    /// Try to parse as a Subscribe (op=3) or Unsubscribe (op=4) payload
    pub fn as_subscription(&self) -> Option<SubscriptionPayload> {
        match self.op {
            OpCode::Subscribe | OpCode::Unsubscribe => self.payload_for(self.op),
            _ => None,
        }
    }

    /// Try to parse the heartbeat's last seen sequence number (op=1)
    pub fn as_heartbeat_seq(&self) -> Option<Option<u64>> {
        if self.op != OpCode::Heartbeat {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_u64))
    }

    fn payload_for<T: DeserializeOwned>(&self, op: OpCode) -> Option<T> {
        if self.op != op {
            return None;
        }
        self.d
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    // === Utilities ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Code and reason for a close frame
    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, &'static str) {
        (code.as_u16(), code.description())
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Snowflake;

    fn client(op: OpCode, d: Option<Value>) -> GatewayMessage {
        GatewayMessage {
            op,
            t: None,
            s: None,
            d,
        }
    }

    #[test]
    fn test_dispatch_message() {
        let msg = GatewayMessage::dispatch("CHANGE", 42, serde_json::json!({"seq": 7}));

        assert_eq!(msg.op, OpCode::Dispatch);
        assert_eq!(msg.t.as_deref(), Some("CHANGE"));
        assert_eq!(msg.s, Some(42));

        let json: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["op"], 0);
        assert_eq!(json["d"]["seq"], 7);
    }

    #[test]
    fn test_hello_message() {
        let json = GatewayMessage::hello(HelloPayload::new()).to_json().unwrap();
        assert!(json.contains("\"op\":10"));
        assert!(json.contains("45000"));
    }

    #[test]
    fn test_heartbeat_ack_has_no_payload() {
        let json = GatewayMessage::heartbeat_ack().to_json().unwrap();
        assert_eq!(json, r#"{"op":11}"#);
    }

    #[test]
    fn test_parse_subscription() {
        let subscribe = client(
            OpCode::Subscribe,
            Some(serde_json::json!({"project_id": "9"})),
        );
        assert_eq!(
            subscribe.as_subscription().map(|p| p.project_id),
            Some(Snowflake::new(9))
        );

        let unsubscribe = client(OpCode::Unsubscribe, Some(serde_json::json!({"project_id": 9})));
        assert!(unsubscribe.as_subscription().is_some());

        let missing = client(OpCode::Subscribe, None);
        assert!(missing.as_subscription().is_none());

        let wrong_op = client(OpCode::Identify, Some(serde_json::json!({"project_id": 9})));
        assert!(wrong_op.as_subscription().is_none());
    }

    #[test]
    fn test_parse_identify() {
        let msg = GatewayMessage::from_json(r#"{"op":2,"d":{"token":"Bearer xyz"}}"#).unwrap();
        assert_eq!(msg.as_identify().unwrap().bare_token(), "xyz");
    }

    #[test]
    fn test_parse_heartbeat() {
        let msg = client(OpCode::Heartbeat, Some(Value::Number(41.into())));
        assert_eq!(msg.as_heartbeat_seq(), Some(Some(41)));

        let msg_null = client(OpCode::Heartbeat, None);
        assert_eq!(msg_null.as_heartbeat_seq(), Some(None));
    }

    #[test]
    fn test_unknown_op_fails_to_parse() {
        assert!(GatewayMessage::from_json(r#"{"op":6}"#).is_err());
    }

    #[test]
    fn test_close_frame() {
        let (code, reason) = GatewayMessage::close_frame(CloseCode::AuthenticationFailed);
        assert_eq!(code, 4004);
        assert!(reason.contains("Authentication"));
    }
}
