use thiserror::Error;
use uuid::Uuid;

/// # Errors produced by suite executions and the executors manager.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Single-execution mode refused a second execution.
    #[error("only single test suite execution is permitted")]
    MultiMode,

    /// `run()` was called on an executor that already ran.
    #[error("execution {id} was already started")]
    AlreadyStarted { id: Uuid },

    /// The worker thread could not be spawned.
    #[error("cannot spawn execution worker: {reason}")]
    Spawn { reason: String },

    /// The suite reported an error.
    #[error("{error}")]
    Plugin { error: String },

    /// The result channel closed without the close message.
    #[error("execution worker terminated unexpectedly")]
    WorkerLost,

    /// Terminal failure of an execution.
    #[error("execution of `{suite}` failed: {source}")]
    Execution {
        suite: String,
        #[source]
        source: Box<ExecutorError>,
    },
}

impl ExecutorError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorError::MultiMode => "executor_multi_mode",
            ExecutorError::AlreadyStarted { .. } => "executor_already_started",
            ExecutorError::Spawn { .. } => "executor_spawn",
            ExecutorError::Plugin { .. } => "executor_plugin",
            ExecutorError::WorkerLost => "executor_worker_lost",
            ExecutorError::Execution { .. } => "executor_execution",
        }
    }
}
