//! # ResourcesPool: membership and lifecycle publication.
//!
//! ```text
//! add(r)      ─► insert, reflow indexes, publish ADDED, forward r's events
//! extract(id) ─► remove, reflow, publish REMOVED (last state), detach r
//! get(id)     ─► Arc<Resource> | UnknownResource
//! all()       ─► Members: bulk connect, infos, select(ids)
//!
//! Resource events ──► { action: CONNECTED|DISCONNECTED|CHANGED, data } ──► RESOURCES pipe
//! ```
//!
//! ## Rules
//! - One resource per id; the pool is the only mutator of membership.
//! - `index` of every member is its insertion position, reassigned on removal.
//! - Bulk operations isolate per-member failures.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::credentials::ResourceId;
use super::dataset::TesterInfo;
use super::error::ResourceError;
use super::resource::Resource;
use crate::events::ResourceEvent;
use crate::messenger::{MsgType, Pipe, encode};

/// Action tag of a pool message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PoolAction {
    Added,
    Removed,
    Connected,
    Disconnected,
    Changed,
}

impl From<ResourceEvent> for PoolAction {
    fn from(event: ResourceEvent) -> Self {
        match event {
            ResourceEvent::Connected => PoolAction::Connected,
            ResourceEvent::Disconnected => PoolAction::Disconnected,
            ResourceEvent::Changed => PoolAction::Changed,
        }
    }
}

/// Payload of `DATA` messages on the resources pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMessage {
    pub action: PoolAction,
    pub data: TesterInfo,
}

#[derive(Default)]
struct Members {
    order: Vec<ResourceId>,
    by_id: HashMap<ResourceId, Arc<Resource>>,
}

impl Members {
    fn reflow(&self) {
        for (index, id) in self.order.iter().enumerate() {
            if let Some(resource) = self.by_id.get(id) {
                resource.set_index(index);
            }
        }
    }
}

/// Collection of all known resources.
pub struct ResourcesPool {
    members: RwLock<Members>,
    publisher: Arc<Pipe>,
}

impl ResourcesPool {
    /// Creates an empty pool publishing to `publisher`.
    pub fn new(publisher: Arc<Pipe>) -> Self {
        Self {
            members: RwLock::new(Members::default()),
            publisher,
        }
    }

    pub fn len(&self) -> usize {
        self.members.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.members.read().by_id.contains_key(id)
    }

    /// Adds `resource` and forwards its lifecycle events.
    ///
    /// A member with the same id is replaced and detached.
    pub fn add(&self, resource: Arc<Resource>) {
        let replaced = {
            let mut members = self.members.write();
            let id = resource.id().clone();
            let replaced = members.by_id.insert(id.clone(), resource.clone());
            if replaced.is_none() {
                members.order.push(id);
            }
            members.reflow();
            replaced
        };
        if let Some(previous) = replaced {
            previous.detach();
        }

        publish(&self.publisher, PoolAction::Added, resource.info());
        for event in [
            ResourceEvent::Connected,
            ResourceEvent::Disconnected,
            ResourceEvent::Changed,
        ] {
            let publisher = self.publisher.clone();
            resource.events().subscribe(event, move |info: TesterInfo| {
                let publisher = publisher.clone();
                async move {
                    publish(&publisher, event.into(), info);
                    Ok(())
                }
            });
        }
    }

    /// Returns the member with `id`.
    pub fn get(&self, id: &ResourceId) -> Result<Arc<Resource>, ResourceError> {
        self.members
            .read()
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| ResourceError::UnknownResource { id: id.clone() })
    }

    /// Removes the member with `id` and stops its event propagation.
    pub fn extract(&self, id: &ResourceId) -> Result<Arc<Resource>, ResourceError> {
        let resource = {
            let mut members = self.members.write();
            let resource = members
                .by_id
                .remove(id)
                .ok_or_else(|| ResourceError::UnknownResource { id: id.clone() })?;
            members.order.retain(|known| known != id);
            members.reflow();
            resource
        };

        let last_state = resource.info();
        resource.detach();
        publish(&self.publisher, PoolAction::Removed, last_state);
        Ok(resource)
    }

    /// Snapshot of the current members, in pool order.
    pub fn all(&self) -> MembersView {
        let members = self.members.read();
        let resources = members
            .order
            .iter()
            .filter_map(|id| members.by_id.get(id).cloned())
            .collect();
        MembersView { resources }
    }
}

fn publish(publisher: &Pipe, action: PoolAction, data: TesterInfo) {
    publisher.try_transmit(encode(&PoolMessage { action, data }), MsgType::Data);
}

/// Bulk operations over a snapshot of the pool members.
pub struct MembersView {
    resources: Vec<Arc<Resource>>,
}

impl MembersView {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Connects every member not held offline; returns the members that failed.
    pub async fn connect(&self) -> Vec<(Arc<Resource>, ResourceError)> {
        let candidates: Vec<_> = self
            .resources
            .iter()
            .filter(|r| !r.keep_disconnected())
            .cloned()
            .collect();

        let results = join_all(candidates.iter().map(|r| r.connect())).await;
        candidates
            .into_iter()
            .zip(results)
            .filter_map(|(resource, result)| match result {
                Ok(()) => None,
                Err(err) => {
                    tracing::warn!(tester = %resource.id(), error = %err, "bulk connect failed");
                    Some((resource, err))
                }
            })
            .collect()
    }

    /// Copy-out infos of every member.
    pub fn infos(&self) -> Vec<TesterInfo> {
        self.resources.iter().map(|r| r.info()).collect()
    }

    /// Members with the given ids; any unknown id fails the whole selection.
    pub fn select(&self, ids: &[ResourceId]) -> Result<Vec<Arc<Resource>>, ResourceError> {
        ids.iter()
            .map(|id| {
                self.resources
                    .iter()
                    .find(|r| r.id() == id)
                    .cloned()
                    .ok_or_else(|| ResourceError::UnknownResource { id: id.clone() })
            })
            .collect()
    }
}
