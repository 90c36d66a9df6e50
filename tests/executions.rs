//! Suite executions through the controller.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Value, json};

use benchvisor::{
    Changes, CoreConfig, Credentials, EXECUTOR_PIPE, Error, ExecutionMode, ExecutorError,
    ExecutorState, Message, MsgType, PluginError, ProductType, ResourceError,
};
use common::{TIMEOUT, bench, eventually, write_plugin};

async fn collect(changes: Changes) -> Vec<Arc<Message>> {
    tokio::time::timeout(TIMEOUT, changes.collect::<Vec<_>>())
        .await
        .expect("execution pipe was not closed")
}

async fn next_notice(changes: &mut Changes) -> String {
    let msg = tokio::time::timeout(TIMEOUT, changes.next())
        .await
        .expect("no notice")
        .expect("executor pipe closed");
    assert_eq!(msg.msg_type, MsgType::Data);
    msg.payload.as_str().unwrap_or_default().to_string()
}

fn only(types: &[MsgType]) -> Option<HashSet<MsgType>> {
    Some(types.iter().copied().collect())
}

#[tokio::test]
async fn echo_suite_publishes_config_then_ends() {
    let b = bench(CoreConfig::default());
    assert_eq!(
        b.core.available_test_suites(),
        vec!["ECHO", "FAIL", "LOOP", "TESTERS"]
    );

    let (id, changes) = b
        .core
        .start_test_suite_listening("ECHO", json!({"value": 42}), only(&[MsgType::Statistics]))
        .await
        .unwrap();

    let msgs = collect(changes).await;
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].payload, json!({"value": 42}));
    assert_eq!(msgs[0].pipe_name, id.to_string());
    assert_eq!(msgs[0].meta["suite_name"], "ECHO");

    let core = b.core.clone();
    assert!(eventually(move || core.executions().is_empty()).await);
}

#[tokio::test]
async fn execution_publishes_state_transitions() {
    let b = bench(CoreConfig::default());
    let (_, changes) = b
        .core
        .start_test_suite_listening("ECHO", json!({"value": 1}), only(&[MsgType::State]))
        .await
        .unwrap();

    let states: Vec<Value> = collect(changes).await.iter().map(|m| m.payload.clone()).collect();
    assert_eq!(
        states,
        vec![
            json!({"state": "RUN", "old_state": "STOPPED"}),
            json!({"state": "STOPPED", "old_state": "RUN"}),
        ]
    );
}

#[tokio::test]
async fn manager_announces_start_and_stop() {
    let b = bench(CoreConfig::default());
    let mut notices = b.core.listen_changes(&[EXECUTOR_PIPE], None).await.unwrap();

    let id = b.core.start_test_suite("ECHO", json!({})).await.unwrap();
    assert_eq!(next_notice(&mut notices).await, format!("Test Suite Started: {id}"));
    assert_eq!(next_notice(&mut notices).await, format!("Test Suite stopped: {id}"));
}

#[tokio::test]
async fn stop_twice_reaps_once() {
    let b = bench(CoreConfig::default());
    let mut notices = b.core.listen_changes(&[EXECUTOR_PIPE], None).await.unwrap();

    let id = b.core.start_test_suite("LOOP", json!({})).await.unwrap();
    assert_eq!(next_notice(&mut notices).await, format!("Test Suite Started: {id}"));

    b.core.stop_test_suite(&id);
    b.core.stop_test_suite(&id);
    assert_eq!(next_notice(&mut notices).await, format!("Test Suite stopped: {id}"));

    b.core.stop_test_suite(&id);
    let extra = tokio::time::timeout(std::time::Duration::from_millis(100), notices.next()).await;
    assert!(extra.is_err(), "unexpected notice: {extra:?}");
    assert!(b.core.executions().is_empty());
}

#[tokio::test]
async fn toggle_pause_round_trip() {
    let b = bench(CoreConfig::default());
    let id = b.core.start_test_suite("LOOP", json!({})).await.unwrap();
    let state = || b.core.executions()[0].state;

    assert_eq!(state(), ExecutorState::Running);
    b.core.toggle_pause(&id);
    assert_eq!(state(), ExecutorState::Paused);
    b.core.toggle_pause(&id);
    assert_eq!(state(), ExecutorState::Running);

    b.core.stop_test_suite(&id);
    let core = b.core.clone();
    assert!(eventually(move || core.executions().is_empty()).await);
    b.core.toggle_pause(&id);
}

#[tokio::test]
async fn paused_execution_can_be_stopped() {
    let b = bench(CoreConfig::default());
    let (id, changes) = b
        .core
        .start_test_suite_listening("LOOP", json!({}), only(&[MsgType::Error]))
        .await
        .unwrap();

    b.core.toggle_pause(&id);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    b.core.stop_test_suite(&id);

    assert!(collect(changes).await.is_empty());
}

#[tokio::test]
async fn single_mode_refuses_second_execution() {
    let b = bench(CoreConfig {
        execution_mode: ExecutionMode::Single,
        ..CoreConfig::default()
    });
    let first = b.core.start_test_suite("LOOP", json!({})).await.unwrap();

    let err = b.core.start_test_suite("ECHO", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::Executor(ExecutorError::MultiMode)));
    assert_eq!(b.core.executions().len(), 1);

    let core = b.core.clone();
    assert!(eventually(move || core.available_pipes().len() == 3).await);

    b.core.stop_test_suite(&first);
    let core = b.core.clone();
    assert!(eventually(move || core.executions().is_empty()).await);
    b.core.start_test_suite("ECHO", json!({})).await.unwrap();
}

#[tokio::test]
async fn failing_suite_is_reported_on_both_pipes() {
    let b = bench(CoreConfig::default());
    let mut notices = b.core.listen_changes(&[EXECUTOR_PIPE], None).await.unwrap();
    let (id, changes) = b
        .core
        .start_test_suite_listening("FAIL", json!({}), only(&[MsgType::Error]))
        .await
        .unwrap();

    let errors = collect(changes).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].payload, json!("port P-0-0-0 has no link"));

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(next_notice(&mut notices).await);
    }
    assert!(seen.contains(&format!("Test Suite Started: {id}")));
    assert!(seen.contains(&format!("Test Suite stopped: {id}")));
    assert!(seen.contains(&"Test Suite Error: FAIL, port P-0-0-0 has no link".to_string()));
}

#[tokio::test]
async fn suites_receive_sessions_of_referenced_testers() {
    let b = bench(CoreConfig::default());
    b.network.set_reachable("10.0.0.1", true);
    let tester = b
        .core
        .add_tester(Credentials::new(ProductType::Vulkan, "10.0.0.1"))
        .await
        .unwrap();

    let config = json!({
        "username": "alice",
        "port_identities": [
            {"tester_id": tester.as_str(), "tester_index": 0, "module_index": 0, "port_index": 0},
            {"tester_id": tester.as_str(), "tester_index": 0, "module_index": 0, "port_index": 1}
        ],
        "config": {}
    });
    let (_, changes) = b
        .core
        .start_test_suite_listening("TESTERS", config, only(&[MsgType::Statistics]))
        .await
        .unwrap();

    let msgs = collect(changes).await;
    assert_eq!(msgs[0].payload, json!({"testers": 1}));
    assert_eq!(b.network.sessions_of("10.0.0.1", "alice"), 1);
}

#[tokio::test]
async fn start_errors_are_typed() {
    let b = bench(CoreConfig::default());

    let err = b.core.start_test_suite("NOPE", json!({})).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Plugin(PluginError::TestSuiteNotExist { .. })
    ));

    let err = b.core.start_test_suite("ECHO", json!(7)).await.unwrap_err();
    assert!(matches!(err, Error::Plugin(PluginError::InvalidConfig { .. })));

    let config = json!({
        "port_identities": [
            {"tester_id": "ffff", "tester_index": 0, "module_index": 0, "port_index": 0}
        ]
    });
    let err = b.core.start_test_suite("ECHO", config).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Plugin(PluginError::Testers(ResourceError::UnknownResource { .. }))
    ));

    let future = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(future.path().join("next")).unwrap();
    std::fs::write(
        future.path().join("next").join("meta.yml"),
        "name: NEXT\nversion: 2.0.0\ncore_version: '>=99.0.0'\nentry_object: Echo\ndata_model: AnyConfig\n",
    )
    .unwrap();
    b.core.register_plugin_path(future.path()).unwrap();
    let err = b.core.start_test_suite("NEXT", json!({})).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Plugin(PluginError::TestSuiteVersion { .. })
    ));

    assert!(b.core.executions().is_empty());
}

#[tokio::test]
async fn suite_info_and_reload() {
    let b = bench(CoreConfig::default());
    let info = b.core.suite_info("ECHO").unwrap();
    assert_eq!(info.meta.name, "ECHO");
    assert_eq!(info.meta.version, "1.0.0");
    assert_eq!(info.meta.author, Some(vec!["bench".to_string()]));
    assert_eq!(info.schema["properties"]["config"]["type"], "object");

    write_plugin(b.plugins.path(), "ECHO2", "Echo");
    assert!(b.core.suite_info("ECHO2").is_err());
    b.core.reload_plugins().unwrap();
    assert!(b.core.suite_info("ECHO2").is_ok());
}

#[tokio::test]
async fn shutdown_stops_executions_and_closes_listeners() {
    let b = bench(CoreConfig::default());
    let (_, changes) = b
        .core
        .start_test_suite_listening("LOOP", json!({}), None)
        .await
        .unwrap();
    let notices = b.core.listen_changes(&[EXECUTOR_PIPE], None).await.unwrap();

    b.core.shutdown().await;

    collect(changes).await;
    collect(notices).await;
    assert!(b.core.executions().is_empty());
    let core = b.core.clone();
    assert!(eventually(move || core.available_pipes().is_empty()).await);
}
