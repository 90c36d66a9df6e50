//! # Test suites: plugin discovery, registry and the suite contract.
//!
//! ```text
//! plugins/<dir>/meta.yml ──► loader ──► PluginRegistry ──► Plugin
//!                              │                             │ parse_config
//!                        PluginCatalog                       │ assign_testers
//!                     (entry + model symbols)                ▼
//!                                                    Arc<dyn TestSuite>
//! ```

mod catalog;
mod contract;
mod error;
mod loader;
mod meta;
mod plugin;
mod registry;
mod suite_fn;

pub use catalog::{ConfigModel, ConfigSchema, PluginCatalog, Symbol};
pub use contract::{OutputFacade, StateConditionsFacade, SuiteContext, SuiteFactory, TestSuite};
pub use error::{PluginError, SuiteError};
pub use loader::load_plugins;
pub use meta::{META_FILE_NAME, PluginMeta, PublicMeta};
pub use plugin::{DEFAULT_USERNAME, Plugin, PluginData, PortIdentity, TestParameters};
pub use registry::{PluginRegistry, SuiteInfo, core_version};
pub use suite_fn::SuiteFn;
