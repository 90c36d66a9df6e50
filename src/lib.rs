//! # benchvisor
//!
//! **Benchvisor** is the orchestration core of a network-test bench.
//!
//! It keeps a durable pool of tester connections, loads versioned test-suite
//! plugins, runs suite executions on isolated workers with pause/resume/stop
//! control, and publishes everything that happens on named message pipes.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!  caller ──────────►│ Controller                                   │
//!                    │  ├─ ResourcesController ─ Storage (JSON file) │
//!                    │  │    └─ ResourcesPool ─ Resource ─ session   │
//!                    │  ├─ PluginRegistry ─ loader ─ PluginCatalog   │
//!                    │  ├─ ExecutorsManager ─ SuiteExecutor          │
//!                    │  └─ MessagesHandler ─ Pipe ─ Changes          │
//!                    └──────┬───────────────────────┬───────────────┘
//!                           │                       │
//!            RESOURCES / EXECUTOR pipes      one worker thread per execution
//!                           │                       │
//!                           ▼                       ▼
//!                    Changes streams        Arc<dyn TestSuite>
//! ```
//!
//! ### Execution lifecycle
//! ```text
//! start_test_suite(name, config)
//!   ├─► registry.get_plugin(name)        TestSuiteNotExist / TestSuiteVersion
//!   ├─► plugin.parse_config(config)      InvalidConfig
//!   ├─► plugin.assign_testers(pool)      UnknownResource
//!   ├─► pipe "<execution id>"
//!   └─► manager.run(executor)            MultiMode
//!         ├─ worker thread: suite.start()  ◄── Pause/Continue/Stop/Cancel
//!         ├─ relay: STATISTICS/PROGRESS/WARNING/ERROR ─► pipe
//!         └─ complete: STOPPED ─► manager reaps, pipe disabled
//! ```
//!
//! ### Tester lifecycle
//! ```text
//! add_tester ─► connect ─► CONNECTED ─► session lost ─► DISCONNECTED
//!                                             └─► retry attempt * step (5 attempts)
//!                                                   ├─ ok   ─► CONNECTED
//!                                                   └─ fail ─► keep_disconnected
//! ```
//!
//! ## Features
//! | Area            | Description                                           | Key types / traits                         |
//! |-----------------|-------------------------------------------------------|--------------------------------------------|
//! | **Facade**      | Public operations over all subsystems.                | [`Controller`], [`ControllerBuilder`]      |
//! | **Messages**    | Named fan-out pipes and filtered subscriptions.       | [`Message`], [`MsgType`], [`Changes`]      |
//! | **Testers**     | Credentials, sessions, pool and durable store.        | [`Credentials`], [`TesterSession`], [`Storage`] |
//! | **Suites**      | Plugin contract, catalog and registry.                | [`TestSuite`], [`SuiteFn`], [`PluginCatalog`] |
//! | **Executions**  | Isolated runs with pause/resume/stop.                 | [`SuiteExecutor`], [`ExecutorsManager`]    |
//! | **Policies**    | Reconnect schedule of lost testers.                   | [`ReconnectPolicy`], [`JitterPolicy`]      |
//! | **Errors**      | Typed errors per subsystem.                           | [`Error`]                                  |
//! | **Configuration** | Centralized settings.                               | [`CoreConfig`]                             |
//!
//! ## Optional features
//! - `logging`: exports [`init_logging`], a `tracing-subscriber` setup.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use benchvisor::{
//!     ConfigSchema, Controller, CoreConfig, Credentials, MemoryStorage, PluginCatalog,
//!     ResourceError, SessionFactory, SessionRef, SuiteContext, SuiteFn,
//! };
//!
//! struct Offline;
//!
//! impl SessionFactory for Offline {
//!     fn create(&self, c: &Credentials, _: &str, _: bool) -> Result<SessionRef, ResourceError> {
//!         Err(ResourceError::InvalidTesterType { product: c.product })
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), benchvisor::Error> {
//!     let catalog = PluginCatalog::new()
//!         .with_entry("Echo", SuiteFn::factory(|ctx: Arc<SuiteContext>| async move {
//!             ctx.output.send_statistics(ctx.params.config.clone());
//!             Ok(())
//!         }))
//!         .with_model("EchoConfig", ConfigSchema::any_object());
//!
//!     let core = Controller::builder(Arc::new(Offline))
//!         .with_config(CoreConfig::default())
//!         .with_storage(Arc::new(MemoryStorage::new()))
//!         .with_catalog(catalog)
//!         .build()?;
//!
//!     core.start().await?;
//!     assert!(core.list_testers_info().is_empty());
//!     assert!(core.available_test_suites().is_empty());
//!     core.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
pub mod events;
pub mod executors;
pub mod messenger;
pub mod policies;
pub mod resources;
pub mod suites;

// ---- Public re-exports ----

pub use core::{Controller, ControllerBuilder, CoreConfig};
pub use error::Error;
pub use events::{ExecutionNotice, ExecutorEvent, Observer, PipeEvent, ResourceEvent};
pub use executors::{
    ExecutionMode, ExecutorError, ExecutorInfo, ExecutorState, ExecutorsManager, SuiteExecutor,
};
pub use messenger::{
    Changes, EXECUTOR_PIPE, MessagesHandler, Message, MessengerError, MsgType, Pipe, Progress,
    RESOURCES_PIPE,
};
pub use policies::{JitterPolicy, ReconnectPolicy};
pub use resources::{
    Credentials, FileStorage, MemoryStorage, ProductType, ResourceError, ResourceId,
    SessionChange, SessionError, SessionFactory, SessionRef, Storage, TesterInfo, TesterSession,
};
pub use suites::{
    ConfigModel, ConfigSchema, PluginCatalog, PluginError, SuiteContext, SuiteError, SuiteFn,
    SuiteInfo, TestSuite,
};

// Optional: `tracing-subscriber` setup.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use core::init_logging;
