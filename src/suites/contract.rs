//! # Test-suite contract.
//!
//! A suite is built by its entry factory from a [`SuiteContext`] and driven
//! by an execution worker:
//!
//! ```text
//! entry(SuiteContext { conditions, output, testers, params }) ─► Arc<dyn TestSuite>
//!   worker:   start() ──────────────────────────────► Ok | Err(Stopped) | Err(Failed)
//!   control:  on_pause() / on_continue() / on_stop()   (concurrently with start)
//! ```
//!
//! The framework never preempts a suite: pausing and stopping take effect at
//! the checkpoints the suite places (`wait_if_paused`, `stop_if_stopped`), or
//! by cancellation of `start()` when the execution is cancelled.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::error::SuiteError;
use super::plugin::TestParameters;
use crate::messenger::Progress;
use crate::resources::Testers;

/// Business logic of a test suite.
#[async_trait]
pub trait TestSuite: Send + Sync {
    /// Runs the suite to completion.
    async fn start(&self) -> Result<(), SuiteError>;

    /// Called after the execution was paused.
    async fn on_pause(&self) {}

    /// Called after the execution was resumed.
    async fn on_continue(&self) {}

    /// Called when the execution is being stopped.
    async fn on_stop(&self) {}
}

/// Pause/stop checkpoints offered to a suite.
#[async_trait]
pub trait StateConditionsFacade: Send + Sync {
    /// Suspends while the execution is paused; returns at once if stopped.
    async fn wait_if_paused(&self);

    /// Fails with [`SuiteError::Stopped`] if a stop was requested.
    async fn stop_if_stopped(&self) -> Result<(), SuiteError>;
}

/// Fire-and-forget output of a suite.
pub trait OutputFacade: Send + Sync {
    fn send_statistics(&self, data: Value);

    fn send_progress(&self, progress: Progress);

    fn send_warning(&self, warning: String);

    fn send_error(&self, error: String);
}

/// Everything a suite is constructed with.
#[derive(Clone)]
pub struct SuiteContext {
    pub conditions: Arc<dyn StateConditionsFacade>,
    pub output: Arc<dyn OutputFacade>,
    /// Fresh sessions of the testers referenced by the port identities.
    pub testers: Testers,
    pub params: TestParameters,
}

/// Entry point of a plugin.
pub type SuiteFactory = Arc<dyn Fn(SuiteContext) -> Arc<dyn TestSuite> + Send + Sync>;
