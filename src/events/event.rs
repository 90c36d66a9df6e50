//! # Lifecycle event keys.
//!
//! Each component that notifies others owns an [`Observer`](super::Observer)
//! keyed by one of the enums below. The key classifies the event; the
//! argument type carries the payload:
//!
//! | Key              | Emitted by          | Argument                     |
//! |------------------|---------------------|------------------------------|
//! | [`ResourceEvent`] | `Resource`         | `TesterInfo` snapshot        |
//! | [`ExecutorEvent`] | `SuiteExecutor`    | [`ExecutionNotice`]          |
//! | [`PipeEvent`]     | `Pipe`             | pipe name (`String`)         |
//!
//! Snapshots are copy-out values, so a callback never observes live mutable
//! state of the emitter.

use uuid::Uuid;

/// Resource lifecycle transitions published to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceEvent {
    /// Session handshake and dataset sync succeeded.
    Connected,
    /// Session was logged off by the user or lost by the device.
    Disconnected,
    /// A module/port change notification refreshed the dataset.
    Changed,
}

impl ResourceEvent {
    /// Returns the upper-case action name used in pool messages.
    pub fn as_action(&self) -> &'static str {
        match self {
            ResourceEvent::Connected => "CONNECTED",
            ResourceEvent::Disconnected => "DISCONNECTED",
            ResourceEvent::Changed => "CHANGED",
        }
    }
}

/// Terminal notifications of a suite execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorEvent {
    /// The execution reached its terminal state (emitted exactly once).
    Stopped,
    /// The execution ended because the plugin or its worker failed.
    Error,
}

/// Notification fired by a pipe towards its owning handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeEvent {
    /// The pipe drained its queue and released every subscriber.
    Disabled,
}

/// Payload of an [`ExecutorEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionNotice {
    /// Execution id (also the name of the execution's pipe).
    pub id: Uuid,
    /// Name of the suite being executed.
    pub suite_name: String,
    /// Failure description for [`ExecutorEvent::Error`].
    pub error: Option<String>,
}

impl ExecutionNotice {
    /// Creates a notice without an error.
    pub fn new(id: Uuid, suite_name: impl Into<String>) -> Self {
        Self {
            id,
            suite_name: suite_name.into(),
            error: None,
        }
    }

    /// Attaches a failure description.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
