//! Narrow write-only views over a [`Pipe`].
//!
//! - [`PipeFacade`] is what an execution relay uses to publish plugin output;
//!   every message carries `meta.suite_name`.
//! - [`PipeStateFacade`] publishes execution state transitions.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::message::{MsgType, Progress, StatePayload, encode};
use super::pipe::Pipe;

/// Output facade of one execution pipe.
#[derive(Debug, Clone)]
pub struct PipeFacade {
    pipe: Arc<Pipe>,
    suite_name: String,
}

impl PipeFacade {
    pub(crate) fn new(pipe: Arc<Pipe>, suite_name: impl Into<String>) -> Self {
        Self {
            pipe,
            suite_name: suite_name.into(),
        }
    }

    fn send(&self, payload: Value, msg_type: MsgType) {
        let mut meta = Map::new();
        meta.insert("suite_name".into(), Value::String(self.suite_name.clone()));
        self.pipe.transmit_with_meta(payload, msg_type, meta);
    }

    /// Publishes plugin statistics.
    pub fn send_statistics<T: Serialize>(&self, data: &T) {
        self.send(encode(data), MsgType::Statistics);
    }

    /// Publishes progress.
    pub fn send_progress(&self, progress: Progress) {
        self.send(encode(&progress), MsgType::Progress);
    }

    /// Publishes a warning text.
    pub fn send_warning(&self, warning: impl std::fmt::Display) {
        self.send(Value::String(warning.to_string()), MsgType::Warning);
    }

    /// Publishes an error text.
    pub fn send_error(&self, error: impl std::fmt::Display) {
        self.send(Value::String(error.to_string()), MsgType::Error);
    }
}

/// State facade of one execution pipe.
#[derive(Debug, Clone)]
pub struct PipeStateFacade {
    pipe: Arc<Pipe>,
}

impl PipeStateFacade {
    pub(crate) fn new(pipe: Arc<Pipe>) -> Self {
        Self { pipe }
    }

    /// Publishes a `STATE` message unless the pipe is already closed.
    pub fn send(&self, state: Option<&str>, old_state: Option<&str>) {
        let payload = StatePayload {
            state: state.map(str::to_owned),
            old_state: old_state.map(str::to_owned),
        };
        self.pipe.try_transmit(encode(&payload), MsgType::State);
    }
}
