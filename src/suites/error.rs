use std::path::PathBuf;

use thiserror::Error;

use crate::resources::ResourceError;

/// # Errors raised by plugin code inside an execution.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuiteError {
    /// A stop was requested; raised by `stop_if_stopped()`. Clean termination.
    #[error("plugin execution is stopped by user")]
    Stopped,

    /// The plugin failed.
    #[error("{error}")]
    Failed {
        /// Failure description reported to the execution pipe.
        error: String,
    },
}

impl SuiteError {
    /// Wraps any displayable failure.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        SuiteError::Failed {
            error: error.to_string(),
        }
    }

    /// True for the user-requested stop signal.
    pub fn is_stop(&self) -> bool {
        matches!(self, SuiteError::Stopped)
    }
}

impl From<anyhow::Error> for SuiteError {
    fn from(error: anyhow::Error) -> Self {
        SuiteError::Failed {
            error: format!("{error:#}"),
        }
    }
}

/// # Errors produced while loading, resolving or preparing plugins.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PluginError {
    /// Malformed metadata, missing symbol or symbol of the wrong kind.
    #[error("invalid plugin at {}: {reason}", path.display())]
    InvalidPlugin { path: PathBuf, reason: String },

    /// A plugin directory could not be read.
    #[error("cannot read plugins at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No suite with that name is registered.
    #[error("test suite `{name}` does not exist")]
    TestSuiteNotExist { name: String },

    /// The suite does not support the running core version.
    #[error("test suite `{name}` requires core {required}, current is {current}")]
    TestSuiteVersion {
        name: String,
        required: String,
        current: String,
    },

    /// Raw configuration did not bind to the suite's model.
    #[error("invalid configuration for `{name}`: {reason}")]
    InvalidConfig { name: String, reason: String },

    /// `assign_testers`/`create_test_suite` called before `parse_config`.
    #[error("configuration of `{name}` is not parsed")]
    ConfigNotParsed { name: String },

    /// A referenced tester could not be resolved.
    #[error(transparent)]
    Testers(#[from] ResourceError),
}

impl PluginError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PluginError::InvalidPlugin { .. } => "plugin_invalid",
            PluginError::Io { .. } => "plugin_io",
            PluginError::TestSuiteNotExist { .. } => "plugin_not_exist",
            PluginError::TestSuiteVersion { .. } => "plugin_version",
            PluginError::InvalidConfig { .. } => "plugin_invalid_config",
            PluginError::ConfigNotParsed { .. } => "plugin_config_not_parsed",
            PluginError::Testers(_) => "plugin_testers",
        }
    }
}
