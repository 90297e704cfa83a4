//! Response body decoding.
//!
//! Tool servers answer either with a bare JSON document or with
//! event-stream framing, where each payload line starts with `data:`.
//! Only the last payload line of an event stream is significant.

use serde_json::Value;

use crate::error::{Error, Result};

/// Prefix of event-stream payload lines.
pub const EVENT_DATA_PREFIX: &str = "data:";

/// Decode a response body in either wire shape.
///
/// The raw body is kept in the error for diagnostics.
pub fn decode_body(body: &str) -> Result<Value> {
    let payload = match last_event_data(body) {
        Some(data) => data,
        None => body,
    };

    serde_json::from_str(payload).map_err(|e| Error::Decode {
        reason: e.to_string(),
        raw: body.to_string(),
    })
}

/// Extract the tool result from a decoded envelope.
///
/// `result` wins, then `error`, and an envelope with neither key is the
/// result itself. An `error` member is returned as an ordinary value; callers
/// inspect the payload's own `success`/`error` fields.
pub fn extract_result(envelope: Value) -> Value {
    match envelope {
        Value::Object(mut map) => {
            if let Some(result) = map.remove("result") {
                result
            } else if let Some(error) = map.remove("error") {
                error
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

/// Frame a JSON value as a single event-stream message.
pub fn encode_event(value: &Value) -> String {
    format!("event: message\n{EVENT_DATA_PREFIX} {value}\n\n")
}

fn last_event_data(body: &str) -> Option<&str> {
    body.lines()
        .filter_map(|line| line.strip_prefix(EVENT_DATA_PREFIX))
        .last()
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
}
