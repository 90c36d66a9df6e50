use std::sync::Arc;

use semver::Version;
use tokio::runtime::Handle;

use super::config::CoreConfig;
use super::controller::Controller;
use crate::error::Error;
use crate::executors::ExecutorsManager;
use crate::messenger::{EXECUTOR_PIPE, MessagesHandler, RESOURCES_PIPE};
use crate::resources::{FileStorage, ResourceContext, ResourcesController, SessionFactory, Storage};
use crate::suites::{PluginCatalog, PluginRegistry, core_version};

/// Builder for constructing a [`Controller`] with optional collaborators.
pub struct ControllerBuilder {
    cfg: CoreConfig,
    factory: Arc<dyn SessionFactory>,
    storage: Option<Arc<dyn Storage>>,
    catalog: PluginCatalog,
    handle: Option<Handle>,
    core_version: Option<Version>,
}

impl ControllerBuilder {
    /// Creates a builder opening tester sessions through `factory`.
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            cfg: CoreConfig::default(),
            factory,
            storage: None,
            catalog: PluginCatalog::new(),
            handle: None,
            core_version: None,
        }
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, cfg: CoreConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the tester store.
    ///
    /// Without it a [`FileStorage`] at `CoreConfig::storage_path` is used.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the symbols plugin descriptors are resolved against.
    pub fn with_catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Spawns background work on `handle` instead of the current runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Overrides the core version plugins are checked against.
    pub fn with_core_version(mut self, version: Version) -> Self {
        self.core_version = Some(version);
        self
    }

    /// Builds the controller.
    ///
    /// Fails with [`Error::Runtime`] when no runtime handle was given and the
    /// caller is outside a tokio runtime.
    pub fn build(self) -> Result<Arc<Controller>, Error> {
        let handle = match self.handle {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|err| Error::Runtime {
                reason: err.to_string(),
            })?,
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(FileStorage::new(self.cfg.storage_path.clone())));

        let messenger = MessagesHandler::new(handle.clone());
        let ctx = ResourceContext {
            factory: self.factory,
            username: self.cfg.username().to_string(),
            reconnect: self.cfg.reconnect,
            handle: handle.clone(),
        };
        let resources =
            ResourcesController::new(messenger.get_pipe(RESOURCES_PIPE), storage, ctx);
        let executors = ExecutorsManager::new(
            self.cfg.execution_mode,
            messenger.get_pipe(EXECUTOR_PIPE),
            handle,
        );
        let plugins = PluginRegistry::new(
            self.catalog,
            self.core_version.unwrap_or_else(core_version),
        );

        Ok(Arc::new(Controller::new_internal(
            self.cfg, messenger, resources, plugins, executors,
        )))
    }
}
