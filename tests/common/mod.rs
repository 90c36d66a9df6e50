//! Shared test helpers: an in-memory tester network and ready-made suites.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use benchvisor::resources::{
    ChangeHook, DisconnectHook, ModuleSnapshot, ModuleState, PortState, TesterSnapshot,
};
use benchvisor::{
    ConfigSchema, Controller, CoreConfig, Credentials, MemoryStorage, PluginCatalog,
    ReconnectPolicy, ResourceError, SessionChange, SessionError, SessionFactory, SessionRef,
    Storage, SuiteContext, SuiteError, SuiteFn, TesterSession,
};

/// Default wait for asynchronous effects.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Hosts that accept logins, plus every session ever created.
#[derive(Default)]
pub struct MockNetwork {
    reachable: Mutex<HashSet<String>>,
    failing_sync: Mutex<HashSet<String>>,
    dials: Mutex<HashMap<String, usize>>,
    handshake: Mutex<Duration>,
    sessions: Mutex<Vec<Arc<MockSession>>>,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_reachable(&self, host: &str, reachable: bool) {
        let mut hosts = self.reachable.lock();
        if reachable {
            hosts.insert(host.to_string());
        } else {
            hosts.remove(host);
        }
    }

    pub fn is_reachable(&self, host: &str) -> bool {
        self.reachable.lock().contains(host)
    }

    /// Makes `snapshot()` of sessions to `host` fail after a good login.
    pub fn set_sync_failing(&self, host: &str, failing: bool) {
        let mut hosts = self.failing_sync.lock();
        if failing {
            hosts.insert(host.to_string());
        } else {
            hosts.remove(host);
        }
    }

    /// Time every login takes before it is answered.
    pub fn set_handshake_delay(&self, delay: Duration) {
        *self.handshake.lock() = delay;
    }

    /// Login attempts made to `host`, failed ones included.
    pub fn dials(&self, host: &str) -> usize {
        self.dials.lock().get(host).copied().unwrap_or(0)
    }

    /// Most recent logged-in session to `host`.
    pub fn online_session(&self, host: &str) -> Option<Arc<MockSession>> {
        self.sessions
            .lock()
            .iter()
            .rev()
            .find(|s| s.host == host && s.is_online())
            .cloned()
    }

    /// Sessions created for `host` with the given owner name.
    pub fn sessions_of(&self, host: &str, username: &str) -> usize {
        self.sessions
            .lock()
            .iter()
            .filter(|s| s.host == host && s.username == username)
            .count()
    }
}

/// Session factory over a [`MockNetwork`].
pub struct MockFactory {
    network: Arc<MockNetwork>,
}

impl MockFactory {
    pub fn new(network: Arc<MockNetwork>) -> Arc<Self> {
        Arc::new(Self { network })
    }
}

impl SessionFactory for MockFactory {
    fn create(
        &self,
        credentials: &Credentials,
        username: &str,
        _debug: bool,
    ) -> Result<SessionRef, ResourceError> {
        let session = Arc::new(MockSession {
            host: credentials.host.clone(),
            port: credentials.port,
            username: username.to_string(),
            network: self.network.clone(),
            online: AtomicBool::new(false),
            disconnect_hook: Mutex::new(None),
            change_hook: Mutex::new(None),
        });
        self.network.sessions.lock().push(session.clone());
        let session: SessionRef = session;
        Ok(session)
    }
}

pub struct MockSession {
    pub host: String,
    pub port: u16,
    pub username: String,
    network: Arc<MockNetwork>,
    online: AtomicBool,
    disconnect_hook: Mutex<Option<DisconnectHook>>,
    change_hook: Mutex<Option<ChangeHook>>,
}

impl MockSession {
    /// Simulates the device dropping the session.
    pub fn drop_connection(&self) {
        self.online.store(false, Ordering::SeqCst);
        if let Some(hook) = self.disconnect_hook.lock().take() {
            hook();
        }
    }

    /// Simulates a push notification from the device.
    pub fn push_change(&self, change: SessionChange) {
        let hook = self.change_hook.lock().clone();
        if let Some(hook) = hook {
            hook(change);
        }
    }
}

#[async_trait]
impl TesterSession for MockSession {
    async fn connect(&self) -> Result<(), SessionError> {
        *self.network.dials.lock().entry(self.host.clone()).or_default() += 1;
        let delay = *self.network.handshake.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if !self.network.is_reachable(&self.host) {
            return Err(SessionError::Unreachable {
                host: self.host.clone(),
                port: self.port,
            });
        }
        self.online.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn logoff(&self) -> Result<(), SessionError> {
        self.online.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn snapshot(&self) -> Result<TesterSnapshot, SessionError> {
        if self.network.failing_sync.lock().contains(&self.host) {
            return Err(SessionError::Protocol {
                reason: "chassis query timed out".into(),
            });
        }
        let ports = (0..2)
            .map(|index| PortState {
                index,
                model: "Odin-10G".into(),
                sync_status: Some(true),
                traffic_on: Some(false),
                ..PortState::default()
            })
            .collect();
        Ok(TesterSnapshot {
            name: format!("bench-{}", self.host),
            reserved_by: String::new(),
            modules: vec![ModuleSnapshot {
                state: ModuleState {
                    index: 0,
                    model: "M2SFP+".into(),
                    ..ModuleState::default()
                },
                ports,
            }],
            ..TesterSnapshot::default()
        })
    }

    fn on_disconnected(&self, hook: DisconnectHook) {
        *self.disconnect_hook.lock() = Some(hook);
    }

    fn on_change(&self, hook: ChangeHook) {
        *self.change_hook.lock() = Some(hook);
    }
}

async fn echo(ctx: Arc<SuiteContext>) -> Result<(), SuiteError> {
    ctx.output.send_statistics(ctx.params.config.clone());
    Ok(())
}

async fn run_until_stopped(ctx: Arc<SuiteContext>) -> Result<(), SuiteError> {
    loop {
        ctx.conditions.wait_if_paused().await;
        ctx.conditions.stop_if_stopped().await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn fail(_: Arc<SuiteContext>) -> Result<(), SuiteError> {
    Err(SuiteError::failed("port P-0-0-0 has no link"))
}

async fn count_testers(ctx: Arc<SuiteContext>) -> Result<(), SuiteError> {
    ctx.output
        .send_statistics(serde_json::json!({ "testers": ctx.testers.len() }));
    Ok(())
}

/// Catalog with the `Echo`, `Loop`, `Fail` and `Testers` entries and the `AnyConfig` model.
pub fn catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with_entry("Echo", SuiteFn::factory(echo))
        .with_entry("Loop", SuiteFn::factory(run_until_stopped))
        .with_entry("Fail", SuiteFn::factory(fail))
        .with_entry("Testers", SuiteFn::factory(count_testers))
        .with_model("AnyConfig", ConfigSchema::any_object())
}

/// Writes a plugin directory whose descriptor points at `entry`.
pub fn write_plugin(root: &Path, name: &str, entry: &str) {
    let dir = root.join(name.to_lowercase());
    std::fs::create_dir_all(&dir).unwrap();
    let meta = format!(
        "name: {name}\nversion: 1.0.0\ncore_version: '>=0.1.0'\nauthor: [bench]\nentry_object: {entry}\ndata_model: AnyConfig\n"
    );
    std::fs::write(dir.join("meta.yml"), meta).unwrap();
}

/// Plugins directory with ECHO, LOOP, FAIL and TESTERS suites.
pub fn plugins_dir() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    write_plugin(root.path(), "ECHO", "Echo");
    write_plugin(root.path(), "LOOP", "Loop");
    write_plugin(root.path(), "FAIL", "Fail");
    write_plugin(root.path(), "TESTERS", "Testers");
    root
}

/// Fast reconnect schedule for tests.
pub fn fast_reconnect() -> ReconnectPolicy {
    ReconnectPolicy {
        step: Duration::from_millis(20),
        max: Duration::from_millis(200),
        ..ReconnectPolicy::default()
    }
}

pub struct Bench {
    pub network: Arc<MockNetwork>,
    pub storage: Arc<MemoryStorage>,
    pub core: Arc<Controller>,
    pub plugins: tempfile::TempDir,
}

/// Controller over a mock network and in-memory storage with the test plugins registered.
pub fn bench(cfg: CoreConfig) -> Bench {
    let network = MockNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let plugins = plugins_dir();
    let core = Controller::builder(MockFactory::new(network.clone()))
        .with_config(cfg)
        .with_storage(storage.clone() as Arc<dyn Storage>)
        .with_catalog(catalog())
        .build()
        .unwrap();
    core.register_plugin_path(plugins.path()).unwrap();
    Bench {
        network,
        storage,
        core,
        plugins,
    }
}

/// Polls `check` until it holds or [`TIMEOUT`] elapses.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
