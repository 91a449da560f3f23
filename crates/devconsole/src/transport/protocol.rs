//! SocketCluster wire frames.
//!
//! Every frame is a JSON text message except pings: protocol v1 servers send
//! `#1` and expect `#2`, v2 servers send an empty frame and expect one back.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const PING_V1: &str = "#1";
pub const PONG_V1: &str = "#2";

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame is neither an event nor a response")]
    Unrecognized,
}

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Heartbeat; `v1` tells which reply the server expects.
    Ping { v1: bool },
    /// Response to a client call identified by `rid`.
    Response {
        rid: u64,
        data: Option<Value>,
        error: Option<Value>,
    },
    /// Publication on a channel.
    Publish { channel: String, data: Value },
    /// Server-side unsubscribe (kick) from a channel.
    Kicked { channel: String, message: Option<String> },
    /// Any other named event.
    Event { event: String, data: Option<Value> },
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    event: Option<String>,
    data: Option<Value>,
    rid: Option<u64>,
    error: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Emit<'a> {
    event: &'a str,
    data: Value,
    cid: u64,
}

pub fn decode(text: &str) -> Result<Frame, ProtocolError> {
    if text.is_empty() {
        return Ok(Frame::Ping { v1: false });
    }
    if text == PING_V1 {
        return Ok(Frame::Ping { v1: true });
    }

    let raw: RawFrame = serde_json::from_str(text)?;

    if let Some(rid) = raw.rid {
        return Ok(Frame::Response {
            rid,
            data: raw.data,
            error: raw.error,
        });
    }

    match raw.event.as_deref() {
        Some("#publish") => {
            let mut data = raw.data.unwrap_or(Value::Null);
            let channel = data
                .get("channel")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(ProtocolError::Unrecognized)?;
            let payload = data
                .get_mut("data")
                .map(Value::take)
                .unwrap_or(Value::Null);
            Ok(Frame::Publish {
                channel,
                data: payload,
            })
        }
        Some("#kickOut") => {
            let data = raw.data.unwrap_or(Value::Null);
            let channel = data
                .get("channel")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(ProtocolError::Unrecognized)?;
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(Frame::Kicked { channel, message })
        }
        Some(event) => Ok(Frame::Event {
            event: event.to_string(),
            data: raw.data,
        }),
        None => Err(ProtocolError::Unrecognized),
    }
}

/// Reply expected for a ping frame.
pub fn pong(v1: bool) -> &'static str {
    if v1 {
        PONG_V1
    } else {
        ""
    }
}

fn emit(event: &str, data: Value, cid: u64) -> String {
    let frame = Emit { event, data, cid };
    // Serializing a struct of strings and JSON values cannot fail.
    serde_json::to_string(&frame).unwrap_or_default()
}

pub fn handshake(cid: u64, auth_token: Option<&str>) -> String {
    emit("#handshake", json!({ "authToken": auth_token }), cid)
}

pub fn subscribe(cid: u64, channel: &str) -> String {
    emit("#subscribe", json!({ "channel": channel }), cid)
}

pub fn unsubscribe(cid: u64, channel: &str) -> String {
    emit("#unsubscribe", json!(channel), cid)
}

/// Human readable reason out of a response `error` value.
pub fn error_reason(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| map.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_both_ping_styles() {
        assert_eq!(decode("").unwrap(), Frame::Ping { v1: false });
        assert_eq!(decode("#1").unwrap(), Frame::Ping { v1: true });
        assert_eq!(pong(true), "#2");
        assert_eq!(pong(false), "");
    }

    #[test]
    fn decodes_publish() {
        let frame =
            decode(r##"{"event":"#publish","data":{"channel":"company.123","data":{"a":1}}}"##)
                .unwrap();
        assert_eq!(
            frame,
            Frame::Publish {
                channel: "company.123".to_string(),
                data: json!({ "a": 1 }),
            }
        );
    }

    #[test]
    fn decodes_responses_with_and_without_error() {
        assert_eq!(
            decode(r#"{"rid":2}"#).unwrap(),
            Frame::Response {
                rid: 2,
                data: None,
                error: None
            }
        );

        match decode(r#"{"rid":3,"error":{"name":"BrokerError","message":"denied"}}"#).unwrap() {
            Frame::Response {
                rid: 3,
                error: Some(error),
                ..
            } => assert_eq!(error_reason(&error), "denied"),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode("{"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            decode(r#"{"data":1}"#),
            Err(ProtocolError::Unrecognized)
        ));
    }

    #[test]
    fn encodes_client_calls() {
        let frame: Value = serde_json::from_str(&subscribe(2, "api.abc")).unwrap();
        assert_eq!(
            frame,
            json!({ "event": "#subscribe", "data": { "channel": "api.abc" }, "cid": 2 })
        );

        let frame: Value = serde_json::from_str(&handshake(1, None)).unwrap();
        assert_eq!(frame["data"]["authToken"], Value::Null);

        let frame: Value = serde_json::from_str(&unsubscribe(4, "api.abc")).unwrap();
        assert_eq!(frame["data"], json!("api.abc"));
        assert_eq!(frame["cid"], json!(4));
    }
}
