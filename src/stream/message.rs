/// Stream envelope parsing
///
/// Every server frame is a JSON object tagged by a string `type`:
/// - `update`: a change notification; the payload is `data` when present,
///   otherwise the whole envelope. An optional `timestamp` carries the
///   server's send time.
/// - `pong`: reply to the keepalive token, ignored.
/// - anything else: recognised but irrelevant, ignored.
///
/// Frames that are not such an object are parse errors and get dropped.
use crate::errors::{SyncError, SyncResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// Liveness probe sent while the connection is open
pub const KEEPALIVE_FRAME: &str = "ping";

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEvent {
    pub payload: Value,
    pub server_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Update(UpdateEvent),
    Pong,
    Other(String),
}

pub fn parse_frame(text: &str) -> SyncResult<StreamMessage> {
    let value: Value = serde_json::from_str(text)?;

    let envelope = value
        .as_object()
        .ok_or_else(|| SyncError::parse("frame is not a JSON object"))?;
    let kind = envelope
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::parse("frame has no string 'type' field"))?;

    match kind {
        "update" => {
            let server_timestamp = envelope
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(parse_timestamp);
            let payload = match envelope.get("data") {
                Some(data) => data.clone(),
                None => value.clone(),
            };
            Ok(StreamMessage::Update(UpdateEvent {
                payload,
                server_timestamp,
            }))
        }
        "pong" => Ok(StreamMessage::Pong),
        other => Ok(StreamMessage::Other(other.to_string())),
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
