//! Core wiring: configuration, builder and the [`Controller`] facade.
//!
//! Internal modules:
//! - [`config`]: settings shared by every subsystem;
//! - [`builder`]: assembles messenger, resources, plugins and executors on one runtime handle;
//! - [`controller`]: the public operations;
//! - `logging`: optional subscriber setup (feature `logging`).

mod builder;
mod config;
mod controller;
#[cfg(feature = "logging")]
mod logging;

pub use builder::ControllerBuilder;
pub use config::CoreConfig;
pub use controller::Controller;
#[cfg(feature = "logging")]
pub use logging::init_logging;
