//! # SuiteExecutor: one test-suite execution.
//!
//! ```text
//! run(observer)
//!   ├─ spawn_worker(plugin) ──► worker thread
//!   ├─ state: STOPPED → RUN
//!   └─ spawn relay task:
//!        relay():    WorkerMessage ─► PipeFacade (STATISTICS/PROGRESS/WARNING/ERROR)
//!                    Close ─► Ok, Error ─► Err(Plugin)
//!                    channel closed ─► ERROR on the pipe, Err(WorkerLost)
//!        complete(): state → STOPPED, stop worker, emit Stopped, disable pipe,
//!                    on error: emit Error, return Err(Execution)
//!
//! toggle_pause(): RUN ⇄ PAUSED  + Pause/OnPause or Continue/OnContinue
//! stop():         RUN|PAUSED → STOPPED + Stop/OnStop/Cancel
//! ```
//!
//! ## Rules
//! - `complete()` runs exactly once per execution; it is the only emitter of
//!   [`ExecutorEvent::Stopped`].
//! - `stop()` and `toggle_pause()` on a stopped execution are no-ops.
//! - The execution pipe is disabled on every exit path.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::error::ExecutorError;
use super::protocol::{ControlEvent, WorkerMessage};
use super::state::{ExecutorInfo, ExecutorState, StateMachine};
use super::worker::spawn_worker;
use crate::events::{ExecutionNotice, ExecutorEvent, Observer};
use crate::messenger::Pipe;
use crate::suites::Plugin;

/// Observer the executor reports its terminal events to.
pub type ExecutorObserver = Observer<ExecutorEvent, ExecutionNotice>;

pub struct SuiteExecutor {
    id: Uuid,
    suite_name: String,
    state: StateMachine,
    pipe: Arc<Pipe>,
    plugin: Mutex<Option<Plugin>>,
    control: Mutex<Option<mpsc::UnboundedSender<ControlEvent>>>,
    join: Mutex<Option<JoinHandle<Result<(), ExecutorError>>>>,
}

impl SuiteExecutor {
    /// Creates an idle execution publishing on `pipe`.
    pub fn new(id: Uuid, pipe: Arc<Pipe>, plugin: Plugin) -> Arc<Self> {
        let state = StateMachine::new();
        state.attach(pipe.state_facade());
        Arc::new(Self {
            id,
            suite_name: plugin.name().to_string(),
            state,
            pipe,
            plugin: Mutex::new(Some(plugin)),
            control: Mutex::new(None),
            join: Mutex::new(None),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    pub fn state(&self) -> ExecutorState {
        self.state.get()
    }

    pub fn info(&self) -> ExecutorInfo {
        ExecutorInfo {
            id: self.id,
            suite_name: self.suite_name.clone(),
            state: self.state(),
        }
    }

    /// Starts the worker and the relay task.
    pub fn run(
        self: &Arc<Self>,
        observer: Arc<ExecutorObserver>,
        handle: &Handle,
    ) -> Result<(), ExecutorError> {
        let plugin = self
            .plugin
            .lock()
            .take()
            .ok_or(ExecutorError::AlreadyStarted { id: self.id })?;
        let channels = spawn_worker(&self.suite_name, plugin)?;

        *self.control.lock() = Some(channels.control);
        self.state.transition(|_| Some(ExecutorState::Running));
        tracing::info!(execution = %self.id, suite = %self.suite_name, "execution started");

        let me = Arc::clone(self);
        let results = channels.results;
        let task = handle.spawn(async move {
            let res = me.relay(results).await;
            me.complete(res, &observer).await
        });
        *self.join.lock() = Some(task);
        Ok(())
    }

    /// Requests the execution to stop.
    pub fn stop(&self) {
        let control = self.control.lock();
        if self
            .state
            .transition(|_| Some(ExecutorState::Stopped))
            .is_none()
        {
            return;
        }
        tracing::info!(execution = %self.id, suite = %self.suite_name, "stop requested");
        if let Some(tx) = control.as_ref() {
            for event in [ControlEvent::Stop, ControlEvent::OnStop, ControlEvent::Cancel] {
                let _ = tx.send(event);
            }
        }
    }

    /// Flips RUN and PAUSED.
    pub fn toggle_pause(&self) {
        let control = self.control.lock();
        let events = match self.state.transition(|state| match state {
            ExecutorState::Running => Some(ExecutorState::Paused),
            ExecutorState::Paused => Some(ExecutorState::Running),
            ExecutorState::Stopped => None,
        }) {
            Some((_, ExecutorState::Paused)) => [ControlEvent::Pause, ControlEvent::OnPause],
            Some((_, ExecutorState::Running)) => [ControlEvent::Continue, ControlEvent::OnContinue],
            _ => return,
        };
        if let Some(tx) = control.as_ref() {
            for event in events {
                let _ = tx.send(event);
            }
        }
    }

    /// Waits for the relay task and returns the execution outcome.
    ///
    /// Returns `Ok(())` if the execution never ran or was already awaited.
    pub async fn wait(&self) -> Result<(), ExecutorError> {
        let task = self.join.lock().take();
        match task {
            Some(task) => task.await.unwrap_or(Err(ExecutorError::WorkerLost)),
            None => Ok(()),
        }
    }

    async fn relay(
        &self,
        mut results: mpsc::UnboundedReceiver<WorkerMessage>,
    ) -> Result<(), ExecutorError> {
        let facade = self.pipe.facade(self.suite_name.clone());
        while let Some(msg) = results.recv().await {
            if self.pipe.is_disabled() {
                tracing::debug!(execution = %self.id, "pipe closed, dropping worker output");
                continue;
            }
            match msg {
                WorkerMessage::Statistics(data) => facade.send_statistics(&data),
                WorkerMessage::Progress(progress) => facade.send_progress(progress),
                WorkerMessage::Warning(warning) => facade.send_warning(warning),
                WorkerMessage::Error(error) => {
                    facade.send_error(&error);
                    return Err(ExecutorError::Plugin { error });
                }
                WorkerMessage::Close => return Ok(()),
            }
        }
        let lost = ExecutorError::WorkerLost;
        if !self.pipe.is_disabled() {
            facade.send_error(&lost);
        }
        Err(lost)
    }

    async fn complete(
        &self,
        res: Result<(), ExecutorError>,
        observer: &ExecutorObserver,
    ) -> Result<(), ExecutorError> {
        self.state.transition(|_| Some(ExecutorState::Stopped));
        if let Some(tx) = self.control.lock().take() {
            let _ = tx.send(ControlEvent::Stop);
            let _ = tx.send(ControlEvent::Cancel);
        }

        let notice = ExecutionNotice::new(self.id, self.suite_name.clone());
        observer.emit(ExecutorEvent::Stopped, notice.clone());
        self.pipe.disable().await;

        match res {
            Ok(()) => {
                tracing::info!(execution = %self.id, suite = %self.suite_name, "execution finished");
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    execution = %self.id,
                    suite = %self.suite_name,
                    error = %err,
                    label = err.as_label(),
                    "execution failed"
                );
                observer.emit(ExecutorEvent::Error, notice.with_error(err.to_string()));
                Err(ExecutorError::Execution {
                    suite: self.suite_name.clone(),
                    source: Box::new(err),
                })
            }
        }
    }
}
