//! # ExecutorsManager: registry of in-flight executions.
//!
//! ```text
//! run(executor) ─► admission check ─► executors[id] = executor ─► "Started" ─► executor.run(observer)
//!                                                                  │
//!   ExecutorEvent::Stopped ─► remove id, "Test Suite stopped: <id>"│
//!   ExecutorEvent::Error   ─► "Test Suite Error: <suite>, <error>" ◄┘
//! ```
//!
//! Notices are DATA messages on the manager's pipe (normally `EXECUTOR`).
//!
//! ## Rules
//! - `stop(id)` and `toggle_pause(id)` ignore unknown ids.
//! - "Test Suite Started" is published before the worker starts, so it always
//!   precedes the execution's stopped notice.
//! - An execution that fails to start is never left registered; its failure is
//!   published as an error notice.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::runtime::Handle;
use uuid::Uuid;

use super::admission::ExecutionMode;
use super::error::ExecutorError;
use super::executor::{ExecutorObserver, SuiteExecutor};
use super::state::ExecutorInfo;
use crate::events::{ExecutionNotice, ExecutorEvent};
use crate::messenger::{MsgType, Pipe};

type Executors = Arc<RwLock<HashMap<Uuid, Arc<SuiteExecutor>>>>;

pub struct ExecutorsManager {
    mode: ExecutionMode,
    executors: Executors,
    pipe: Arc<Pipe>,
    observer: Arc<ExecutorObserver>,
    handle: Handle,
}

impl ExecutorsManager {
    /// Creates a manager publishing notices on `pipe`.
    pub fn new(mode: ExecutionMode, pipe: Arc<Pipe>, handle: Handle) -> Self {
        let executors: Executors = Arc::new(RwLock::new(HashMap::new()));
        let observer = Arc::new(ExecutorObserver::new(handle.clone()));

        let registry = executors.clone();
        let notices = pipe.clone();
        observer.subscribe(ExecutorEvent::Stopped, move |notice: ExecutionNotice| {
            let registry = registry.clone();
            let notices = notices.clone();
            async move {
                registry.write().remove(&notice.id);
                notify(&notices, format!("Test Suite stopped: {}", notice.id));
                Ok(())
            }
        });

        let notices = pipe.clone();
        observer.subscribe(ExecutorEvent::Error, move |notice: ExecutionNotice| {
            let notices = notices.clone();
            async move {
                let error = notice.error.unwrap_or_default();
                notify(
                    &notices,
                    format!("Test Suite Error: {}, {}", notice.suite_name, error),
                );
                Ok(())
            }
        });

        Self {
            mode,
            executors,
            pipe,
            observer,
            handle,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Registers and starts `executor`; returns its id.
    pub fn run(&self, executor: Arc<SuiteExecutor>) -> Result<Uuid, ExecutorError> {
        let id = executor.id();
        {
            let mut executors = self.executors.write();
            if executors.contains_key(&id) {
                return Err(ExecutorError::AlreadyStarted { id });
            }
            if !self.mode.admits(executors.len()) {
                return Err(ExecutorError::MultiMode);
            }
            executors.insert(id, executor.clone());
        }

        notify(&self.pipe, format!("Test Suite Started: {id}"));
        if let Err(err) = executor.run(self.observer.clone(), &self.handle) {
            self.executors.write().remove(&id);
            notify(
                &self.pipe,
                format!("Test Suite Error: {}, {}", executor.suite_name(), err),
            );
            return Err(err);
        }
        Ok(id)
    }

    pub fn stop(&self, id: &Uuid) {
        if let Some(executor) = self.get(id) {
            executor.stop();
        }
    }

    pub fn toggle_pause(&self, id: &Uuid) {
        if let Some(executor) = self.get(id) {
            executor.toggle_pause();
        }
    }

    /// Stops every registered execution.
    pub fn stop_all(&self) {
        let executors: Vec<_> = self.executors.read().values().cloned().collect();
        for executor in executors {
            executor.stop();
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<SuiteExecutor>> {
        self.executors.read().get(id).cloned()
    }

    /// Infos of every registered execution.
    pub fn list(&self) -> Vec<ExecutorInfo> {
        self.executors.read().values().map(|e| e.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.executors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.read().is_empty()
    }
}

fn notify(pipe: &Pipe, text: String) {
    if !pipe.try_transmit(Value::String(text), MsgType::Data) {
        tracing::debug!(pipe = %pipe.name(), "notice dropped, pipe closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Observer;
    use crate::suites::{
        ConfigSchema, Plugin, PluginData, PluginMeta, SuiteContext, SuiteError, SuiteFactory,
        SuiteFn,
    };
    use crate::messenger::Message;
    use tokio::sync::mpsc;
    use semver::{Version, VersionReq};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;

    async fn until_stopped(ctx: Arc<SuiteContext>) -> Result<(), SuiteError> {
        loop {
            ctx.conditions.wait_if_paused().await;
            ctx.conditions.stop_if_stopped().await?;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn finish(ctx: Arc<SuiteContext>) -> Result<(), SuiteError> {
        ctx.output.send_statistics(json!({"done": true}));
        Ok(())
    }

    fn executor(handle: &Handle) -> Arc<SuiteExecutor> {
        executor_with(handle, SuiteFn::factory(until_stopped))
    }

    fn executor_with(handle: &Handle, entry: SuiteFactory) -> Arc<SuiteExecutor> {
        let data = PluginData {
            meta: PluginMeta {
                name: "LOOP".into(),
                version: Version::new(1, 0, 0),
                core_version: VersionReq::STAR,
                author: None,
                entry_object: "Loop".into(),
                data_model: "LoopConfig".into(),
            },
            entry,
            model: ConfigSchema::any_object(),
            path: PathBuf::from("loop"),
        };
        let mut plugin = Plugin::new(data, false);
        plugin.parse_config(json!({})).unwrap();

        let id = Uuid::new_v4();
        let pipe = Pipe::new(id.to_string(), handle, Arc::new(Observer::new(handle.clone())));
        SuiteExecutor::new(id, pipe, plugin)
    }

    fn manager(mode: ExecutionMode) -> ExecutorsManager {
        let handle = Handle::current();
        let pipe = Pipe::new("EXECUTOR", &handle, Arc::new(Observer::new(handle.clone())));
        ExecutorsManager::new(mode, pipe, handle)
    }

    async fn wait_empty(manager: &ExecutorsManager) {
        for _ in 0..200 {
            if manager.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("executions were not reaped");
    }

    #[tokio::test]
    async fn test_stopped_execution_is_reaped() {
        let handle = Handle::current();
        let manager = manager(ExecutionMode::Concurrent);
        let id = manager.run(executor(&handle)).unwrap();
        assert_eq!(manager.list().len(), 1);

        manager.stop(&id);
        manager.stop(&id);
        wait_empty(&manager).await;

        manager.stop(&id);
        manager.toggle_pause(&id);
    }

    #[tokio::test]
    async fn test_single_mode_refuses_second_execution() {
        let handle = Handle::current();
        let manager = manager(ExecutionMode::Single);
        let first = manager.run(executor(&handle)).unwrap();

        let second = executor(&handle);
        let second_id = second.id();
        assert!(matches!(manager.run(second), Err(ExecutorError::MultiMode)));
        assert!(manager.get(&second_id).is_none());

        manager.stop(&first);
        wait_empty(&manager).await;
        let third = manager.run(executor(&handle)).unwrap();
        manager.stop_all();
        wait_empty(&manager).await;
        assert!(manager.get(&third).is_none());
    }

    #[tokio::test]
    async fn test_running_an_execution_twice_keeps_the_first() {
        let handle = Handle::current();
        let manager = manager(ExecutionMode::Concurrent);
        let exec = executor(&handle);
        let id = manager.run(exec.clone()).unwrap();

        assert!(matches!(
            manager.run(exec),
            Err(ExecutorError::AlreadyStarted { .. })
        ));
        assert!(manager.get(&id).is_some());

        manager.stop(&id);
        wait_empty(&manager).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_started_notice_precedes_stopped() {
        let handle = Handle::current();
        let manager = manager(ExecutionMode::Concurrent);
        let (tx, mut rx) = mpsc::unbounded_channel::<Option<Arc<Message>>>();
        manager.pipe.add_stream(Uuid::new_v4(), tx).await;

        let mut ids = Vec::new();
        for _ in 0..10 {
            ids.push(manager.run(executor_with(&handle, SuiteFn::factory(finish))).unwrap());
        }
        wait_empty(&manager).await;

        let mut notices = Vec::new();
        while notices.len() < 2 * ids.len() {
            let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            notices.push(msg.payload.as_str().unwrap().to_string());
        }
        for id in ids {
            let position = |text: String| notices.iter().position(|n| *n == text).unwrap();
            assert!(
                position(format!("Test Suite Started: {id}"))
                    < position(format!("Test Suite stopped: {id}"))
            );
        }
    }
}
