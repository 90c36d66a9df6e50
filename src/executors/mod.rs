//! Suite executions: isolated workers, run state and the manager.
//!
//! ## Contents
//! - [`SuiteExecutor`] one execution: worker, relay, run state
//! - [`ExecutorsManager`] registry of in-flight executions
//! - [`ExecutionMode`] admission of concurrent executions
//! - [`ExecutorState`], [`ExecutorInfo`] run state and its read model
//! - [`ControlEvent`], [`WorkerMessage`] worker channel protocol
//! - [`StateConditions`] worker-side pause/stop checkpoints
//!
//! ## Quick wiring
//! ```text
//! ExecutorsManager ──► SuiteExecutor ── ControlEvent ──► worker thread
//!        ▲                  │        ◄── WorkerMessage ──     │
//!        │                  ▼                                 ▼
//!   Stopped/Error     execution pipe                 Arc<dyn TestSuite>
//! ```

mod admission;
mod conditions;
mod error;
mod executor;
mod manager;
mod protocol;
mod state;
mod worker;

pub use admission::ExecutionMode;
pub use conditions::StateConditions;
pub use error::ExecutorError;
pub use executor::{ExecutorObserver, SuiteExecutor};
pub use manager::ExecutorsManager;
pub use protocol::{ControlEvent, WorkerMessage, WorkerOutput};
pub use state::{ExecutorInfo, ExecutorState, StateMachine};
pub use worker::{WorkerChannels, spawn_worker};
