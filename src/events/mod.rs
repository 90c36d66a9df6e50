//! Lifecycle events: keys, payloads and the observer dispatcher.
//!
//! ## Contents
//! - [`Observer`] keyed fire-and-forget fan-out of async callbacks
//! - [`ResourceEvent`], [`ExecutorEvent`], [`PipeEvent`] event keys
//! - [`ExecutionNotice`] payload of executor events
//!
//! ## Quick reference
//! - **Publishers**: `Resource` (connected/disconnected/changed), `SuiteExecutor`
//!   (stopped/error), `Pipe` (disabled).
//! - **Consumers**: `ResourcesPool` (republishes on the resources pipe),
//!   `ExecutorsManager` (reaps executions), `MessagesHandler` (forgets pipes).

mod event;
mod observer;

pub use event::{ExecutionNotice, ExecutorEvent, PipeEvent, ResourceEvent};
pub use observer::{Callback, Observer};
