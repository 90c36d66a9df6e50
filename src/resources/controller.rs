//! # ResourcesController: pool + durable store.
//!
//! Every operation orders its two mutations so the store stays the source of
//! truth:
//!
//! | Operation       | Order                                                   |
//! |-----------------|---------------------------------------------------------|
//! | `add_tester`    | connect → save → pool add (unreachable testers are never stored) |
//! | `remove_tester` | pool extract → disconnect → delete                      |
//! | `connect`       | connect → save                                          |
//! | `disconnect`    | disconnect → save                                       |
//! | `start`         | load all → pool add → bulk connect → persist failures as held offline |

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::credentials::{Credentials, ResourceId};
use super::dataset::TesterInfo;
use super::error::ResourceError;
use super::pool::ResourcesPool;
use super::resource::{Resource, ResourceContext, ResourceOptions};
use super::storage::Storage;
use super::transport::SessionRef;
use crate::messenger::Pipe;

/// Session handles handed to a plugin, keyed by tester id.
pub type Testers = HashMap<ResourceId, SessionRef>;

/// Resolves tester ids to fresh sessions for plugin use.
pub trait TesterResolver: Send + Sync {
    /// Fails with `UnknownResource` if any id is not in the pool.
    fn resolve(&self, ids: &[ResourceId], username: &str, debug: bool) -> Result<Testers, ResourceError>;
}

/// Coordinates the live pool with the durable store.
pub struct ResourcesController {
    store: Arc<dyn Storage>,
    pool: ResourcesPool,
    ctx: ResourceContext,
    started: AtomicBool,
}

impl ResourcesController {
    pub fn new(publisher: Arc<Pipe>, store: Arc<dyn Storage>, ctx: ResourceContext) -> Self {
        Self {
            store,
            pool: ResourcesPool::new(publisher),
            ctx,
            started: AtomicBool::new(false),
        }
    }

    pub fn pool(&self) -> &ResourcesPool {
        &self.pool
    }

    /// Restores every stored tester and connects those not held offline.
    ///
    /// Only the first call has an effect.
    pub async fn start(&self) -> Result<(), ResourceError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        for record in self.store.get_all().await? {
            let resource = match Resource::new(
                Credentials::from_stored(&record),
                ResourceOptions::from(&record),
                self.ctx.clone(),
            ) {
                Ok(resource) => resource,
                Err(err) => {
                    tracing::warn!(tester = %record.id, error = %err, "skipping stored tester");
                    continue;
                }
            };
            self.pool.add(resource);
        }

        let failed = self.pool.all().connect().await;
        for (resource, _) in failed {
            resource.set_keep_disconnected(true);
            self.store.save(resource.store_data()).await?;
        }
        tracing::info!(testers = self.pool.len(), "resources restored");
        Ok(())
    }

    /// Connects a new tester and registers it; returns its id.
    ///
    /// A tester already in the store is not reconnected.
    pub async fn add_tester(&self, credentials: Credentials) -> Result<ResourceId, ResourceError> {
        let resource = Resource::new(credentials, ResourceOptions::default(), self.ctx.clone())?;
        let id = resource.id().clone();
        if self.store.is_registered(&id).await? {
            return Ok(id);
        }
        resource.connect().await?;
        self.store.save(resource.store_data()).await?;
        self.pool.add(resource);
        Ok(id)
    }

    /// Removes a tester from the pool, closes it and forgets it.
    pub async fn remove_tester(&self, id: &ResourceId) -> Result<(), ResourceError> {
        let resource = self.pool.extract(id)?;
        match resource.disconnect().await {
            Ok(()) | Err(ResourceError::IsDisconnected { .. }) => {}
            Err(err) => {
                tracing::warn!(tester = %id, error = %err, "logoff of removed tester failed");
            }
        }
        self.store.delete(id).await?;
        Ok(())
    }

    /// Connects a known tester.
    pub async fn connect(&self, id: &ResourceId) -> Result<(), ResourceError> {
        let resource = self.pool.get(id)?;
        resource.connect().await?;
        self.store.save(resource.store_data()).await?;
        Ok(())
    }

    /// Disconnects a known tester and keeps it offline.
    pub async fn disconnect(&self, id: &ResourceId) -> Result<(), ResourceError> {
        let resource = self.pool.get(id)?;
        resource.disconnect().await?;
        self.store.save(resource.store_data()).await?;
        Ok(())
    }

    /// Infos of every tester in pool order.
    pub fn list_testers_info(&self) -> Vec<TesterInfo> {
        self.pool.all().infos()
    }

    /// Info of one tester.
    pub fn tester_info(&self, id: &ResourceId) -> Result<TesterInfo, ResourceError> {
        Ok(self.pool.get(id)?.info())
    }

    /// New sessions for the given testers.
    pub fn get_testers_by_id(
        &self,
        ids: &[ResourceId],
        username: &str,
        debug: bool,
    ) -> Result<Testers, ResourceError> {
        self.pool
            .all()
            .select(ids)?
            .into_iter()
            .map(|resource| {
                let session = resource.prepare_session(username, debug)?;
                Ok::<_, ResourceError>((resource.id().clone(), session))
            })
            .collect()
    }
}

impl TesterResolver for ResourcesController {
    fn resolve(&self, ids: &[ResourceId], username: &str, debug: bool) -> Result<Testers, ResourceError> {
        self.get_testers_by_id(ids, username, debug)
    }
}
