//! # Controller: the public surface of the core.
//!
//! ```text
//!                       ┌──────────────────────────────┐
//!  add/remove/connect ─►│ ResourcesController ──► RESOURCES pipe
//!  register_plugin_path►│ PluginRegistry               │
//!  start_test_suite ───►│ Plugin ─► SuiteExecutor ─► ExecutorsManager ─► EXECUTOR pipe
//!  listen_changes ─────►│ MessagesHandler ─► Changes   │
//!                       └──────────────────────────────┘
//! ```
//!
//! ## Starting a suite
//! 1. resolve the plugin (`TestSuiteNotExist`, `TestSuiteVersion`)
//! 2. bind the raw configuration (`InvalidConfig`)
//! 3. open sessions to the referenced testers (`UnknownResource`)
//! 4. create the execution pipe named after a new execution id
//! 5. hand the executor to the manager (`MultiMode`); on failure the pipe is disabled

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::builder::ControllerBuilder;
use super::config::CoreConfig;
use crate::error::Error;
use crate::executors::{ExecutorInfo, ExecutorsManager, SuiteExecutor};
use crate::messenger::{Changes, MessagesHandler, MsgType, Pipe};
use crate::resources::{Credentials, ResourceId, ResourcesController, SessionFactory, TesterInfo};
use crate::suites::{Plugin, PluginRegistry, SuiteInfo};

/// Facade over resources, plugins, executions and messages.
pub struct Controller {
    cfg: CoreConfig,
    messenger: Arc<MessagesHandler>,
    resources: ResourcesController,
    plugins: PluginRegistry,
    executors: ExecutorsManager,
}

impl Controller {
    /// Starts building a controller opening sessions through `factory`.
    pub fn builder(factory: Arc<dyn SessionFactory>) -> ControllerBuilder {
        ControllerBuilder::new(factory)
    }

    pub(crate) fn new_internal(
        cfg: CoreConfig,
        messenger: Arc<MessagesHandler>,
        resources: ResourcesController,
        plugins: PluginRegistry,
        executors: ExecutorsManager,
    ) -> Self {
        Self {
            cfg,
            messenger,
            resources,
            plugins,
            executors,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn messenger(&self) -> &Arc<MessagesHandler> {
        &self.messenger
    }

    pub fn resources(&self) -> &ResourcesController {
        &self.resources
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn executors(&self) -> &ExecutorsManager {
        &self.executors
    }

    /// Restores stored testers and connects them. Only the first call has an effect.
    pub async fn start(&self) -> Result<(), Error> {
        self.resources.start().await?;
        Ok(())
    }

    /// Connects and registers a tester; returns its id.
    pub async fn add_tester(&self, credentials: Credentials) -> Result<ResourceId, Error> {
        Ok(self.resources.add_tester(credentials).await?)
    }

    pub async fn remove_tester(&self, id: &ResourceId) -> Result<(), Error> {
        Ok(self.resources.remove_tester(id).await?)
    }

    pub async fn connect_tester(&self, id: &ResourceId) -> Result<(), Error> {
        Ok(self.resources.connect(id).await?)
    }

    pub async fn disconnect_tester(&self, id: &ResourceId) -> Result<(), Error> {
        Ok(self.resources.disconnect(id).await?)
    }

    pub fn list_testers_info(&self) -> Vec<TesterInfo> {
        self.resources.list_testers_info()
    }

    pub fn tester_info(&self, id: &ResourceId) -> Result<TesterInfo, Error> {
        Ok(self.resources.tester_info(id)?)
    }

    /// Adds a plugins directory and reloads every registered one.
    pub fn register_plugin_path(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        Ok(self.plugins.register_path(path)?)
    }

    pub fn reload_plugins(&self) -> Result<(), Error> {
        Ok(self.plugins.reload()?)
    }

    pub fn available_test_suites(&self) -> Vec<String> {
        self.plugins.available_test_suites()
    }

    pub fn suite_info(&self, name: &str) -> Result<SuiteInfo, Error> {
        Ok(self.plugins.suite_info(name)?)
    }

    /// Starts a suite execution; returns the execution id, which is also the
    /// name of the execution's pipe.
    pub async fn start_test_suite(&self, name: &str, config: Value) -> Result<Uuid, Error> {
        self.start_test_suite_with(name, config, self.cfg.debug_connection)
            .await
    }

    /// Like [`start_test_suite`](Self::start_test_suite) with an explicit
    /// session debug flag.
    pub async fn start_test_suite_with(
        &self,
        name: &str,
        config: Value,
        debug: bool,
    ) -> Result<Uuid, Error> {
        let (id, pipe, plugin) = self.prepare(name, config, debug)?;
        self.launch(id, pipe, plugin).await
    }

    /// Starts a suite with a subscription to its pipe taken before the
    /// execution runs, so no message of the execution is missed.
    pub async fn start_test_suite_listening(
        &self,
        name: &str,
        config: Value,
        filter: Option<HashSet<MsgType>>,
    ) -> Result<(Uuid, Changes), Error> {
        let (id, pipe, plugin) = self.prepare(name, config, self.cfg.debug_connection)?;
        let changes = self.messenger.changes(&[pipe.name()], filter).await?;
        self.launch(id, pipe, plugin).await?;
        Ok((id, changes))
    }

    pub fn stop_test_suite(&self, id: &Uuid) {
        self.executors.stop(id);
    }

    pub fn toggle_pause(&self, id: &Uuid) {
        self.executors.toggle_pause(id);
    }

    /// Infos of the running executions.
    pub fn executions(&self) -> Vec<ExecutorInfo> {
        self.executors.list()
    }

    /// Subscribes to the named pipes.
    pub async fn listen_changes(
        &self,
        names: &[&str],
        filter: Option<HashSet<MsgType>>,
    ) -> Result<Changes, Error> {
        Ok(self.messenger.changes(names, filter).await?)
    }

    pub fn available_pipes(&self) -> Vec<String> {
        self.messenger.available_pipes()
    }

    /// Stops every execution, waits for them, then disables every pipe.
    pub async fn shutdown(&self) {
        let running: Vec<Arc<SuiteExecutor>> = self
            .executors
            .list()
            .iter()
            .filter_map(|info| self.executors.get(&info.id))
            .collect();
        self.executors.stop_all();
        for executor in running {
            if let Err(err) = executor.wait().await {
                tracing::debug!(execution = %executor.id(), error = %err, "execution ended with error");
            }
        }
        for name in self.messenger.available_pipes() {
            self.messenger.disable_pipe(&name).await;
        }
        tracing::info!("controller shut down");
    }

    fn prepare(
        &self,
        name: &str,
        config: Value,
        debug: bool,
    ) -> Result<(Uuid, Arc<Pipe>, Plugin), Error> {
        let mut plugin = self.plugins.get_plugin(name, debug)?;
        plugin.parse_config(config)?;
        plugin.assign_testers(&self.resources)?;
        let id = Uuid::new_v4();
        let pipe = self.messenger.get_pipe(&id.to_string());
        Ok((id, pipe, plugin))
    }

    async fn launch(&self, id: Uuid, pipe: Arc<Pipe>, plugin: Plugin) -> Result<Uuid, Error> {
        let executor = SuiteExecutor::new(id, pipe.clone(), plugin);
        match self.executors.run(executor) {
            Ok(id) => Ok(id),
            Err(err) => {
                pipe.disable().await;
                Err(err.into())
            }
        }
    }
}
