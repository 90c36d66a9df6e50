//! # Resource: one tester connection and its dataset.
//!
//! ```text
//!                connect()                 disconnect()
//!  {offline} ─────────────────► {online} ─────────────────► {offline, keep_disconnected}
//!      ▲                           │
//!      │      device drops session │
//!      └───── on_connection_lost ◄─┘
//!               ├─ reset dataset, renew session, emit DISCONNECTED
//!               ├─ keep_disconnected? stop
//!               └─ for (attempt, delay) in reconnect.schedule():
//!                     sleep(delay); connect() → Ok: stop
//!                  exhausted → keep_disconnected = true
//! ```
//!
//! ## Rules
//! - `connect()` on an online resource fails with `IsConnected`; a failed
//!   handshake leaves `keep_disconnected == false`.
//! - `connect()` order: handshake → sync → change hook → emit CONNECTED →
//!   loss hook. A failed sync logs the session off; the resource stays offline.
//! - A detached resource (extracted from the pool) never stays logged in:
//!   `connect()` refuses it, and a handshake that completes after the detach
//!   is logged off again.
//! - `disconnect()` sets `keep_disconnected`, logs off and replaces the
//!   session handle; a logged-off handle is never reused.
//! - Hooks of a replaced session are ignored.
//! - The dataset is written only by this resource; readers get copies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio::runtime::Handle;

use super::credentials::{Credentials, ResourceId, StoredResource};
use super::dataset::{ResourceDataset, TesterInfo};
use super::error::ResourceError;
use super::transport::{SessionChange, SessionError, SessionFactory, SessionRef, TesterSession};
use crate::events::{Observer, ResourceEvent};
use crate::policies::ReconnectPolicy;

/// Shared collaborators every resource is built with.
#[derive(Clone)]
pub struct ResourceContext {
    /// Builds session handles.
    pub factory: Arc<dyn SessionFactory>,
    /// Owner name of the pool's own sessions.
    pub username: String,
    /// Schedule of automatic reconnects.
    pub reconnect: ReconnectPolicy,
    /// Runtime used for event callbacks and reconnect loops.
    pub handle: Handle,
}

/// Restored attributes of a known tester.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub name: Option<String>,
    pub keep_disconnected: bool,
}

impl From<&StoredResource> for ResourceOptions {
    fn from(record: &StoredResource) -> Self {
        Self {
            name: Some(record.name.clone()),
            keep_disconnected: record.keep_disconnected,
        }
    }
}

/// In-memory representation of one tester.
pub struct Resource {
    me: Weak<Resource>,
    id: ResourceId,
    credentials: Credentials,
    ctx: ResourceContext,
    dataset: RwLock<ResourceDataset>,
    session: RwLock<SessionRef>,
    events: Observer<ResourceEvent, TesterInfo>,
    transition: tokio::sync::Mutex<()>,
    detached: AtomicBool,
}

impl Resource {
    /// Validates the credentials and creates an offline resource.
    pub fn new(
        credentials: Credentials,
        options: ResourceOptions,
        ctx: ResourceContext,
    ) -> Result<Arc<Self>, ResourceError> {
        credentials.validate()?;
        let session = ctx.factory.create(&credentials, &ctx.username, false)?;

        let mut dataset = ResourceDataset::new(&credentials, options.name);
        dataset.keep_disconnected = options.keep_disconnected;

        Ok(Arc::new_cyclic(|me| Self {
            me: me.clone(),
            id: credentials.id(),
            events: Observer::new(ctx.handle.clone()),
            dataset: RwLock::new(dataset),
            session: RwLock::new(session),
            transition: tokio::sync::Mutex::new(()),
            detached: AtomicBool::new(false),
            credentials,
            ctx,
        }))
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Lifecycle events of this resource.
    pub fn events(&self) -> &Observer<ResourceEvent, TesterInfo> {
        &self.events
    }

    pub fn is_online(&self) -> bool {
        self.session.read().is_online()
    }

    pub fn keep_disconnected(&self) -> bool {
        self.dataset.read().keep_disconnected
    }

    pub fn set_keep_disconnected(&self, value: bool) {
        self.dataset.write().keep_disconnected = value;
    }

    /// Position in the pool (display only).
    pub fn set_index(&self, index: usize) {
        self.dataset.write().index = index;
    }

    /// Copy-out snapshot of the dataset.
    pub fn info(&self) -> TesterInfo {
        self.dataset.read().info()
    }

    /// Durable record of this tester.
    pub fn store_data(&self) -> StoredResource {
        self.dataset.read().store_data()
    }

    /// Fresh session for a plugin; never the pool's own connection.
    pub fn prepare_session(&self, username: &str, debug: bool) -> Result<SessionRef, ResourceError> {
        self.ctx.factory.create(&self.credentials, username, debug)
    }

    /// Stops event propagation and automatic reconnects.
    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::Release);
        self.events.reset();
        self.set_keep_disconnected(true);
    }

    fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    /// Opens the session, syncs the dataset and wires device hooks.
    pub async fn connect(&self) -> Result<(), ResourceError> {
        let _transition = self.transition.lock().await;
        if self.is_detached() {
            return Err(ResourceError::UnknownResource {
                id: self.id.clone(),
            });
        }
        let session = self.session.read().clone();
        if session.is_online() {
            return Err(ResourceError::IsConnected {
                id: self.id.clone(),
            });
        }
        self.set_keep_disconnected(false);

        session.connect().await.map_err(|e| self.communication(e))?;
        let snapshot = match session.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.abandon(&session).await;
                return Err(self.communication(err));
            }
        };
        if self.is_detached() {
            tracing::debug!(tester = %self.id, "tester removed during login, logging off");
            self.abandon(&session).await;
            return Err(ResourceError::UnknownResource {
                id: self.id.clone(),
            });
        }
        self.dataset
            .write()
            .apply_snapshot(snapshot, session.is_online());

        let watched = Arc::downgrade(&session);
        let me = self.me.clone();
        session.on_change(Arc::new(move |change| {
            if let Some(resource) = me.upgrade()
                && resource.is_current(&watched)
            {
                resource.on_data_changed(change);
            }
        }));

        self.events.emit(ResourceEvent::Connected, self.info());
        tracing::info!(tester = %self.id, host = %self.credentials.host, "tester connected");

        let watched = Arc::downgrade(&session);
        let me = self.me.clone();
        session.on_disconnected(Box::new(move || {
            if let Some(resource) = me.upgrade()
                && resource.is_current(&watched)
            {
                let handle = resource.ctx.handle.clone();
                handle.spawn(resource.on_connection_lost());
            }
        }));
        Ok(())
    }

    /// User-initiated disconnect; suppresses automatic reconnects.
    pub async fn disconnect(&self) -> Result<(), ResourceError> {
        let _transition = self.transition.lock().await;
        let session = self.session.read().clone();
        if !session.is_online() {
            return Err(ResourceError::IsDisconnected {
                id: self.id.clone(),
            });
        }
        self.set_keep_disconnected(true);

        let logoff = session.logoff().await;
        self.renew_session()?;
        self.dataset.write().reset_connection();
        self.events.emit(ResourceEvent::Disconnected, self.info());
        tracing::info!(tester = %self.id, "tester disconnected");

        logoff.map_err(|e| self.communication(e))
    }

    fn on_connection_lost(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            self.dataset.write().reset_connection();
            if let Err(err) = self.renew_session() {
                tracing::error!(tester = %self.id, error = %err, "cannot renew lost session");
                return;
            }
            self.events.emit(ResourceEvent::Disconnected, self.info());
            tracing::warn!(tester = %self.id, "tester connection lost");

            if self.keep_disconnected() {
                return;
            }
            for (attempt, delay) in self.ctx.reconnect.schedule() {
                tokio::time::sleep(delay).await;
                if self.keep_disconnected() || self.is_detached() {
                    return;
                }
                match self.connect().await {
                    Ok(()) => return,
                    Err(ResourceError::IsConnected { .. } | ResourceError::UnknownResource { .. }) => {
                        return;
                    }
                    Err(err) => {
                        tracing::debug!(tester = %self.id, attempt, error = %err, "reconnect attempt failed");
                    }
                }
            }
            self.set_keep_disconnected(true);
            tracing::warn!(
                tester = %self.id,
                attempts = self.ctx.reconnect.attempts,
                "giving up reconnecting; tester stays offline"
            );
        }
        .boxed()
    }

    /// Logs off a half-opened session and replaces the handle.
    async fn abandon(&self, session: &SessionRef) {
        if let Err(err) = session.logoff().await {
            tracing::debug!(tester = %self.id, error = %err, "logoff of abandoned session failed");
        }
        if let Err(err) = self.renew_session() {
            tracing::error!(tester = %self.id, error = %err, "cannot renew session");
        }
    }

    fn on_data_changed(&self, change: SessionChange) {
        if self.dataset.write().apply_change(&change) {
            self.events.emit(ResourceEvent::Changed, self.info());
        }
    }

    fn renew_session(&self) -> Result<(), ResourceError> {
        let fresh = self
            .ctx
            .factory
            .create(&self.credentials, &self.ctx.username, false)?;
        *self.session.write() = fresh;
        Ok(())
    }

    fn is_current(&self, session: &Weak<dyn TesterSession>) -> bool {
        Weak::ptr_eq(session, &Arc::downgrade(&*self.session.read()))
    }

    fn communication(&self, source: SessionError) -> ResourceError {
        ResourceError::TesterCommunication {
            id: self.id.clone(),
            host: self.credentials.host.clone(),
            port: self.credentials.port,
            source,
        }
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("host", &self.credentials.host)
            .field("online", &self.is_online())
            .finish()
    }
}
