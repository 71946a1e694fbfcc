//! Shared model and JSON codec for the hub's live channel and REST surface.
//!
//! This crate owns the wire representation used by both `client` and `cli`.
//! Every inbound message is decoded once, at the transport boundary, into a
//! [`ServerMessage`] variant; every outbound message is a [`ClientMessage`]
//! variant. Nothing past the codec sees untyped JSON.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Sensors, poses, point sets, clusters, world mask polygons |
//! | [`config`] | Filter, DBSCAN and sink parameter records |
//! | [`message`] | Tagged unions for the live channel |
//! | [`rest`] | REST paths and request bodies |

pub mod config;
pub mod message;
pub mod model;
pub mod rest;

#[cfg(test)]
#[path = "lib_test.rs"]
mod lib_test;

pub use config::{DbscanConfig, FilterConfig, Sink, SinkId, SinkKind};
pub use message::{ClientMessage, ServerMessage};
pub use model::{
    ClusterItem, Endpoint, PointSet, Polygon, Pose, RoiKind, Sensor, SensorId, SensorMask, SensorMode,
    SensorPatch, WorldMask,
};

use serde_json::Value;

/// Error returned by [`decode_message`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(#[source] serde_json::Error),
    /// The JSON value has no string `type` field.
    #[error("message has no `type` field")]
    MissingType,
    /// The `type` field names a message this client does not understand.
    #[error("unknown message type `{0}`")]
    UnknownType(String),
    /// The `type` is known but the payload does not match its schema.
    #[error("invalid `{kind}` payload: {source}")]
    Schema {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one inbound text message.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed text, [`CodecError::MissingType`]
/// when the discriminator is absent, [`CodecError::UnknownType`] for message
/// kinds outside the contract and [`CodecError::Schema`] when the payload
/// does not match the kind's schema.
pub fn decode_message(text: &str) -> Result<ServerMessage, CodecError> {
    let value: Value = serde_json::from_str(text).map_err(CodecError::Json)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?
        .to_owned();
    if !ServerMessage::KINDS.contains(&kind.as_str()) {
        return Err(CodecError::UnknownType(kind));
    }
    serde_json::from_value(value).map_err(|source| CodecError::Schema { kind, source })
}

/// Encode one outbound message as JSON text.
///
/// Serializing these types cannot fail (string keys, finite layout), so a
/// failure degrades to an empty object rather than an error path.
#[must_use]
pub fn encode_message(message: &ClientMessage) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| String::from("{}"))
}
