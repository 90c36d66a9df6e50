//! # Core configuration.
//!
//! Provides [`CoreConfig`], the settings the [`ControllerBuilder`](super::ControllerBuilder)
//! wires into every subsystem.
//!
//! ## Sentinel values
//! - `reconnect.attempts = 0` → a lost tester is never reconnected automatically
//! - `username` empty → [`DEFAULT_USERNAME`] is used

use std::path::PathBuf;

use crate::executors::ExecutionMode;
use crate::policies::ReconnectPolicy;
use crate::suites::DEFAULT_USERNAME;

/// Configuration of a [`Controller`](super::Controller).
///
/// ## Field semantics
/// - `storage_path`: JSON file backing the tester store (used unless a storage is injected)
/// - `execution_mode`: how many suite executions may be registered at once
/// - `reconnect`: retry schedule after a tester drops its session
/// - `username`: owner name of the sessions the pool keeps open
/// - `debug_connection`: default debug flag of sessions handed to suites
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over reading sentinel
/// values directly.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    /// Path of the tester store file.
    pub storage_path: PathBuf,

    /// Admission of concurrent executions.
    pub execution_mode: ExecutionMode,

    /// Reconnect schedule of lost testers.
    pub reconnect: ReconnectPolicy,

    /// Session owner name used by the pool.
    pub username: String,

    /// Debug flag of sessions created for suites.
    pub debug_connection: bool,
}

impl CoreConfig {
    /// Session owner name, falling back to the default for an empty value.
    pub fn username(&self) -> &str {
        if self.username.is_empty() {
            DEFAULT_USERNAME
        } else {
            &self.username
        }
    }

    /// True if only one execution may be registered at a time.
    pub fn is_single_mode(&self) -> bool {
        self.execution_mode == ExecutionMode::Single
    }
}

impl Default for CoreConfig {
    /// Default configuration:
    /// - `storage_path = store.json`
    /// - `execution_mode = Concurrent`
    /// - `reconnect = 5 attempts, 2s linear step`
    /// - `username = "xoa-manager"`
    /// - `debug_connection = false`
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("store.json"),
            execution_mode: ExecutionMode::Concurrent,
            reconnect: ReconnectPolicy::default(),
            username: DEFAULT_USERNAME.to_string(),
            debug_connection: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.username(), "xoa-manager");
        assert!(!cfg.is_single_mode());
        assert_eq!(cfg.reconnect.attempts, 5);
    }

    #[test]
    fn test_empty_username_falls_back() {
        let cfg = CoreConfig {
            username: String::new(),
            ..CoreConfig::default()
        };
        assert_eq!(cfg.username(), DEFAULT_USERNAME);
    }
}
