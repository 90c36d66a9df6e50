//! Crate-level error.
//!
//! Every subsystem has its own error enum; [`Error`] wraps them for the
//! [`Controller`](crate::Controller) facade:
//!
//! - [`MessengerError`] unknown pipes;
//! - [`ResourceError`] tester lookup, state conflicts and communication;
//! - [`PluginError`] loading, resolving and configuring suites;
//! - [`ExecutorError`] admission and execution failures.
//!
//! Each type provides `as_label()` for logs.

use thiserror::Error;

use crate::executors::ExecutorError;
use crate::messenger::MessengerError;
use crate::resources::ResourceError;
use crate::suites::PluginError;

/// # Errors returned by the controller facade.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Messenger(#[from] MessengerError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// No tokio runtime to spawn background work on.
    #[error("no tokio runtime available: {reason}")]
    Runtime { reason: String },
}

impl Error {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use benchvisor::{Error, ExecutorError};
    ///
    /// let err = Error::from(ExecutorError::MultiMode);
    /// assert_eq!(err.as_label(), "executor_multi_mode");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::Messenger(e) => e.as_label(),
            Error::Resource(e) => e.as_label(),
            Error::Plugin(e) => e.as_label(),
            Error::Executor(e) => e.as_label(),
            Error::Runtime { .. } => "runtime_unavailable",
        }
    }
}
