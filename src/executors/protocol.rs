//! # Worker protocol: the two one-directional channels of an execution.
//!
//! ```text
//! SuiteExecutor ── ControlEvent ──►  worker thread
//! SuiteExecutor ◄── WorkerMessage ── worker thread
//! ```
//!
//! The worker ends every run with [`WorkerMessage::Close`]. A result channel
//! that closes without it means the worker died.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::messenger::Progress;
use crate::suites::OutputFacade;

/// Control event sent to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Block `wait_if_paused` checkpoints.
    Pause,
    /// Release `wait_if_paused` checkpoints.
    Continue,
    /// Make `stop_if_stopped` checkpoints fail.
    Stop,
    /// Cancel the in-flight `start()`.
    Cancel,
    /// Invoke the suite's `on_pause` hook.
    OnPause,
    /// Invoke the suite's `on_continue` hook.
    OnContinue,
    /// Invoke the suite's `on_stop` hook.
    OnStop,
}

impl ControlEvent {
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlEvent::Pause => "PAUSE",
            ControlEvent::Continue => "CONTINUE",
            ControlEvent::Stop => "STOP",
            ControlEvent::Cancel => "CANCEL",
            ControlEvent::OnPause => "ON_PAUSE",
            ControlEvent::OnContinue => "ON_CONTINUE",
            ControlEvent::OnStop => "ON_STOP",
        }
    }
}

/// Result message sent by the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    Statistics(Value),
    Progress(Progress),
    Warning(String),
    Error(String),
    /// End of the run.
    Close,
}

/// Output facade handed to suites inside the worker.
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl WorkerOutput {
    pub fn new(tx: mpsc::UnboundedSender<WorkerMessage>) -> Self {
        Self { tx }
    }

    fn send(&self, msg: WorkerMessage) {
        let _ = self.tx.send(msg);
    }
}

impl OutputFacade for WorkerOutput {
    fn send_statistics(&self, data: Value) {
        self.send(WorkerMessage::Statistics(data));
    }

    fn send_progress(&self, progress: Progress) {
        self.send(WorkerMessage::Progress(progress));
    }

    fn send_warning(&self, warning: String) {
        self.send(WorkerMessage::Warning(warning));
    }

    fn send_error(&self, error: String) {
        self.send(WorkerMessage::Error(error));
    }
}
