//! Server-to-client frames.
//!
//! The channel carries one JSON object per frame. Four shapes exist:
//!
//! | Shape | Recognized by | Decodes to |
//! |---|---|---|
//! | typed snapshot | `type == "auction_update"` | [`Inbound::Snapshot`] (body under `data`, or inline) |
//! | bid accepted | `success` present and not null | [`Inbound::BidAccepted`] |
//! | bid rejected | `error` present and not null | [`Inbound::BidRejected`] |
//! | legacy snapshot | no `type`, `title` present | [`Inbound::Snapshot`] |
//!
//! Anything else is [`Inbound::Unrecognized`]. When one frame carries several
//! discriminators the order of the table is the precedence.

use serde_json::{Map, Value};

use crate::{
    auction::AuctionUpdate,
    errors::{ProtocolError, Result},
};

/// Discriminator value for typed snapshot frames.
pub const AUCTION_UPDATE_TYPE: &str = "auction_update";

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Full auction state; replaces whatever the client held before.
    Snapshot(AuctionUpdate),

    /// The most recently sent bid was accepted.
    BidAccepted {
        /// Human-readable confirmation.
        message: String,
    },

    /// A bid was rejected.
    BidRejected {
        /// Flattened, space-joined rejection text.
        reason: String,
    },

    /// Valid JSON object matching no known shape.
    Unrecognized,
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// - `Json` if the frame is not valid JSON
/// - `NotAnObject` if the frame is not a JSON object
/// - `InvalidSnapshot` if a frame identified as a snapshot has an invalid body
pub fn decode(raw: &str) -> Result<Inbound> {
    let Value::Object(mut object) = serde_json::from_str::<Value>(raw)? else {
        return Err(ProtocolError::NotAnObject);
    };

    // Null-valued keys count as absent
    object.retain(|_, value| !value.is_null());

    let frame_type = object.get("type").cloned();
    if frame_type.as_ref().and_then(Value::as_str) == Some(AUCTION_UPDATE_TYPE) {
        let body = match object.remove("data") {
            Some(Value::Object(data)) => data,
            Some(other) => {
                return Err(ProtocolError::InvalidSnapshot {
                    reason: format!("`data` must be an object, got {other}"),
                });
            },
            None => {
                object.remove("type");
                object
            },
        };
        return snapshot(body);
    }

    if let Some(message) = object.get("success") {
        return Ok(Inbound::BidAccepted { message: text_of(message) });
    }

    if let Some(error) = object.get("error") {
        return Ok(Inbound::BidRejected { reason: flatten_reason(error) });
    }

    if frame_type.is_none() && object.contains_key("title") {
        return snapshot(object);
    }

    Ok(Inbound::Unrecognized)
}

fn snapshot(body: Map<String, Value>) -> Result<Inbound> {
    serde_json::from_value(Value::Object(body))
        .map(Inbound::Snapshot)
        .map_err(|e| ProtocolError::InvalidSnapshot { reason: e.to_string() })
}

/// Normalize a rejection payload into one string.
///
/// Accepts a string, a list of strings, or a map of field names to message
/// lists; nested containers are flattened in order and joined with spaces.
pub fn flatten_reason(error: &Value) -> String {
    let mut parts = Vec::new();
    collect_parts(error, &mut parts);
    parts.join(" ")
}

fn collect_parts(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_parts(item, parts)),
        Value::Object(fields) => fields.values().for_each(|item| collect_parts(item, parts)),
        Value::Null => {},
        other => parts.push(text_of(other)),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
