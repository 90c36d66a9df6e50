use thiserror::Error;

/// # Errors produced by the messenger.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessengerError {
    /// A subscription referenced a pipe the handler does not own.
    #[error("unknown message pipe `{name}`")]
    UnknownPipe {
        /// Requested pipe name.
        name: String,
    },
}

impl MessengerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            MessengerError::UnknownPipe { .. } => "messenger_unknown_pipe",
        }
    }
}
