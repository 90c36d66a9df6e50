//! # Message model carried by pipes.
//!
//! A [`Message`] is immutable once built by a pipe and shared between
//! subscribers as `Arc<Message>`. Payloads are plain JSON values so that
//! producers (pool, executors, plugins) and consumers never share Rust types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification of a message, used for subscription filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MsgType {
    /// Execution state transition ([`StatePayload`]).
    State,
    /// Generic data (pool updates, manager notices).
    Data,
    /// Plugin statistics.
    Statistics,
    /// Plugin progress ([`Progress`]).
    Progress,
    /// Non-fatal plugin warning.
    Warning,
    /// Plugin or execution error.
    Error,
}

impl MsgType {
    /// Returns the wire name of the type.
    pub fn as_label(&self) -> &'static str {
        match self {
            MsgType::State => "STATE",
            MsgType::Data => "DATA",
            MsgType::Statistics => "STATISTICS",
            MsgType::Progress => "PROGRESS",
            MsgType::Warning => "WARNING",
            MsgType::Error => "ERROR",
        }
    }
}

/// One unit of output fanned out by a pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Name of the pipe that produced the message.
    pub pipe_name: String,
    /// Optional routing metadata (e.g. `suite_name`).
    #[serde(default)]
    pub meta: Map<String, Value>,
    /// Message classification.
    #[serde(rename = "type")]
    pub msg_type: MsgType,
    /// Message body.
    pub payload: Value,
}

/// Payload of [`MsgType::State`] messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePayload {
    pub state: Option<String>,
    pub old_state: Option<String>,
}

/// Payload of [`MsgType::Progress`] messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    #[serde(rename = "loop")]
    pub iteration: u32,
}

impl Progress {
    /// Progress of `current` out of 100 in the first loop.
    pub fn new(current: u32) -> Self {
        Self {
            current,
            total: 100,
            iteration: 0,
        }
    }
}

/// Serializes `value` into a payload; unserializable values become `null`.
pub(crate) fn encode<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "dropping unserializable payload");
        Value::Null
    })
}
