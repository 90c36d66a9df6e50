//! # Isolated execution worker.
//!
//! Each execution runs on its own OS thread with a private current-thread
//! runtime. The coordinator reaches it only through the two channels of
//! [`protocol`](super::protocol).
//!
//! ```text
//! worker thread
//!   block_on(select! {
//!     suite.start()  (or cancellation)  ─► outcome
//!     control loop:  recv() ─► dispatch ─► pause/resume/stop/cancel/hooks
//!   })
//!   outcome ─► [Error(text)] ─► Close
//! ```
//!
//! ## Rules
//! - Every orderly exit ends with [`WorkerMessage::Close`].
//! - `SuiteError::Stopped` and cancellation are clean exits.
//! - A dropped control sender cancels the suite.
//! - A panic unwinds the thread; the result channel closes without `Close`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::conditions::StateConditions;
use super::error::ExecutorError;
use super::protocol::{ControlEvent, WorkerMessage, WorkerOutput};
use crate::suites::{Plugin, SuiteError, TestSuite};

/// Executor-side ends of a worker's channels.
pub struct WorkerChannels {
    pub control: mpsc::UnboundedSender<ControlEvent>,
    pub results: mpsc::UnboundedReceiver<WorkerMessage>,
}

/// Starts a worker thread running `plugin`.
pub fn spawn_worker(name: &str, plugin: Plugin) -> Result<WorkerChannels, ExecutorError> {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (results_tx, results_rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name(format!("suite-{name}"))
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    let _ = results_tx.send(WorkerMessage::Error(format!(
                        "cannot start worker runtime: {err}"
                    )));
                    let _ = results_tx.send(WorkerMessage::Close);
                    return;
                }
            };
            runtime.block_on(run_worker(plugin, control_rx, results_tx));
        })
        .map_err(|err| ExecutorError::Spawn {
            reason: err.to_string(),
        })?;

    Ok(WorkerChannels {
        control: control_tx,
        results: results_rx,
    })
}

async fn run_worker(
    plugin: Plugin,
    mut control: mpsc::UnboundedReceiver<ControlEvent>,
    results: mpsc::UnboundedSender<WorkerMessage>,
) {
    let conditions = Arc::new(StateConditions::new());
    let output = Arc::new(WorkerOutput::new(results.clone()));

    let suite = match plugin.create_test_suite(conditions.clone(), output) {
        Ok(suite) => suite,
        Err(err) => {
            let _ = results.send(WorkerMessage::Error(err.to_string()));
            let _ = results.send(WorkerMessage::Close);
            return;
        }
    };

    let cancel = CancellationToken::new();
    let outcome = {
        let run = async {
            tokio::select! {
                res = suite.start() => Some(res),
                _ = cancel.cancelled() => None,
            }
        };
        let listen = async {
            while let Some(event) = control.recv().await {
                dispatch(event, &conditions, suite.as_ref(), &cancel).await;
            }
            cancel.cancel();
            std::future::pending::<()>().await
        };
        tokio::select! {
            res = run => res,
            _ = listen => None,
        }
    };

    while let Ok(event) = control.try_recv() {
        if event == ControlEvent::OnStop {
            suite.on_stop().await;
        }
    }

    match outcome {
        Some(Ok(())) => {}
        Some(Err(SuiteError::Stopped)) => {
            tracing::debug!("suite stopped at checkpoint");
        }
        Some(Err(err)) => {
            let _ = results.send(WorkerMessage::Error(err.to_string()));
        }
        None => {
            tracing::debug!("suite cancelled");
        }
    }
    let _ = results.send(WorkerMessage::Close);
}

async fn dispatch(
    event: ControlEvent,
    conditions: &StateConditions,
    suite: &dyn TestSuite,
    cancel: &CancellationToken,
) {
    tracing::trace!(event = event.as_label(), "control event");
    match event {
        ControlEvent::Pause => conditions.pause(),
        ControlEvent::Continue => conditions.resume(),
        ControlEvent::Stop => conditions.stop(),
        ControlEvent::Cancel => cancel.cancel(),
        ControlEvent::OnPause => suite.on_pause().await,
        ControlEvent::OnContinue => suite.on_continue().await,
        ControlEvent::OnStop => suite.on_stop().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suites::{
        ConfigSchema, PluginData, PluginMeta, SuiteContext, SuiteFactory, SuiteFn,
    };
    use semver::{Version, VersionReq};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;

    fn plugin(entry: SuiteFactory) -> Plugin {
        let data = PluginData {
            meta: PluginMeta {
                name: "T".into(),
                version: Version::new(1, 0, 0),
                core_version: VersionReq::STAR,
                author: None,
                entry_object: "T".into(),
                data_model: "TConfig".into(),
            },
            entry,
            model: ConfigSchema::any_object(),
            path: PathBuf::from("t"),
        };
        let mut plugin = Plugin::new(data, false);
        plugin.parse_config(json!({"value": 42})).unwrap();
        plugin
    }

    async fn collect(mut rx: mpsc::UnboundedReceiver<WorkerMessage>) -> Vec<WorkerMessage> {
        let mut out = Vec::new();
        while let Ok(Some(msg)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_echo_then_close() {
        let entry = SuiteFn::factory(|ctx: Arc<SuiteContext>| async move {
            ctx.output.send_statistics(ctx.params.config.clone());
            Ok(())
        });
        let ch = spawn_worker("echo", plugin(entry)).unwrap();
        let msgs = collect(ch.results).await;
        assert_eq!(
            msgs,
            vec![
                WorkerMessage::Statistics(json!({"value": 42})),
                WorkerMessage::Close
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_reports_error_then_close() {
        let entry = SuiteFn::factory(|_| async { Err(SuiteError::failed("boom")) });
        let ch = spawn_worker("fail", plugin(entry)).unwrap();
        let msgs = collect(ch.results).await;
        assert_eq!(
            msgs,
            vec![WorkerMessage::Error("boom".into()), WorkerMessage::Close]
        );
    }

    async fn until_stopped(ctx: Arc<SuiteContext>) -> Result<(), SuiteError> {
        loop {
            ctx.conditions.wait_if_paused().await;
            ctx.conditions.stop_if_stopped().await?;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn explode(_: Arc<SuiteContext>) -> Result<(), SuiteError> {
        panic!("suite exploded")
    }

    #[tokio::test]
    async fn test_stop_is_a_clean_exit() {
        let ch = spawn_worker("loop", plugin(SuiteFn::factory(until_stopped))).unwrap();
        ch.control.send(ControlEvent::Pause).unwrap();
        ch.control.send(ControlEvent::Stop).unwrap();
        let msgs = collect(ch.results).await;
        assert_eq!(msgs, vec![WorkerMessage::Close]);
    }

    #[tokio::test]
    async fn test_cancel_and_dropped_control_end_the_run() {
        let sleeper = || {
            SuiteFn::factory(|_| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
        };

        let ch = spawn_worker("cancel", plugin(sleeper())).unwrap();
        ch.control.send(ControlEvent::Cancel).unwrap();
        assert_eq!(collect(ch.results).await, vec![WorkerMessage::Close]);

        let ch = spawn_worker("dropped", plugin(sleeper())).unwrap();
        drop(ch.control);
        assert_eq!(collect(ch.results).await, vec![WorkerMessage::Close]);
    }

    #[tokio::test]
    async fn test_panic_closes_channel_without_close() {
        let ch = spawn_worker("panic", plugin(SuiteFn::factory(explode))).unwrap();
        assert!(collect(ch.results).await.is_empty());
    }
}
