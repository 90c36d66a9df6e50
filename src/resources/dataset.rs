//! # Per-tester dataset.
//!
//! The dataset is a flat arena: modules keyed by module index and ports keyed
//! by `(module, port)`. Push notifications address records by those keys, so
//! nested records never hold back-references to their tester.
//!
//! ```text
//! ResourceDataset
//!   ├─ identity: id, product, host, port, password, name, index
//!   ├─ state:    reserved_by, is_connected, keep_disconnected, limits
//!   ├─ modules:  { m → ModuleState }
//!   └─ ports:    { (m, p) → PortState }
//! ```
//!
//! Readers only ever get [`TesterInfo`], a copy-out projection without the
//! password.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::credentials::{Credentials, Password, ProductType, ResourceId, StoredResource};
use super::transport::{ModuleState, PortState, SessionChange, TesterLimits, TesterSnapshot};

/// Display name of a tester that was never synced.
pub const UNNAMED: &str = " - ";

/// Mutable state of one tester.
#[derive(Debug, Clone)]
pub struct ResourceDataset {
    pub id: ResourceId,
    pub product: ProductType,
    pub host: String,
    pub port: u16,
    pub password: Password,
    pub name: String,
    pub index: usize,
    pub reserved_by: String,
    pub is_connected: bool,
    pub keep_disconnected: bool,
    pub limits: TesterLimits,
    modules: BTreeMap<u8, ModuleState>,
    ports: BTreeMap<(u8, u8), PortState>,
}

impl ResourceDataset {
    /// Empty dataset of a tester that was never connected.
    pub fn new(credentials: &Credentials, name: Option<String>) -> Self {
        Self {
            id: credentials.id(),
            product: credentials.product,
            host: credentials.host.clone(),
            port: credentials.port,
            password: credentials.password.clone(),
            name: name.unwrap_or_else(|| UNNAMED.to_string()),
            index: 0,
            reserved_by: String::new(),
            is_connected: false,
            keep_disconnected: false,
            limits: TesterLimits::default(),
            modules: BTreeMap::new(),
            ports: BTreeMap::new(),
        }
    }

    /// Replaces the device-derived part of the dataset.
    pub fn apply_snapshot(&mut self, snapshot: TesterSnapshot, online: bool) {
        self.name = snapshot.name;
        self.reserved_by = snapshot.reserved_by;
        self.limits = snapshot.limits;
        self.is_connected = online;
        self.keep_disconnected = false;
        self.modules.clear();
        self.ports.clear();
        for module in snapshot.modules {
            let m = module.state.index;
            for port in module.ports {
                self.ports.insert((m, port.index), port);
            }
            self.modules.insert(m, module.state);
        }
    }

    /// Applies a push notification; returns `false` if it addressed an unknown record.
    pub fn apply_change(&mut self, change: &SessionChange) -> bool {
        match change {
            SessionChange::TesterReservedBy { username } => {
                self.reserved_by = username.clone();
                true
            }
            SessionChange::ModuleReservedBy { module, username } => {
                match self.modules.get_mut(module) {
                    Some(record) => {
                        record.reserved_by = username.clone();
                        true
                    }
                    None => false,
                }
            }
            SessionChange::PortReservedBy {
                module,
                port,
                username,
            } => self.update_port(*module, *port, |p| p.reserved_by = username.clone()),
            SessionChange::Traffic { module, port, on } => {
                self.update_port(*module, *port, |p| p.traffic_on = Some(*on))
            }
            SessionChange::Sync {
                module,
                port,
                in_sync,
            } => self.update_port(*module, *port, |p| p.sync_status = Some(*in_sync)),
        }
    }

    fn update_port(&mut self, module: u8, port: u8, f: impl FnOnce(&mut PortState)) -> bool {
        match self.ports.get_mut(&(module, port)) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Forgets everything learned from the last session.
    pub fn reset_connection(&mut self) {
        self.is_connected = false;
        self.modules.clear();
        self.ports.clear();
    }

    /// Number of known modules.
    pub fn modules_len(&self) -> usize {
        self.modules.len()
    }

    /// Copy-out projection for readers.
    pub fn info(&self) -> TesterInfo {
        let modules = self
            .modules
            .values()
            .map(|module| {
                let module_id = format!("{}-{}", self.id, module.index);
                let ports = self
                    .ports
                    .range((module.index, u8::MIN)..=(module.index, u8::MAX))
                    .map(|(_, port)| PortInfo {
                        id: format!("{module_id}-{}", port.index),
                        state: port.clone(),
                    })
                    .collect();
                ModuleInfo {
                    id: module_id,
                    state: module.clone(),
                    ports,
                }
            })
            .collect();

        TesterInfo {
            id: self.id.clone(),
            product: self.product,
            host: self.host.clone(),
            port: self.port,
            name: self.name.clone(),
            index: self.index,
            reserved_by: self.reserved_by.clone(),
            is_connected: self.is_connected,
            keep_disconnected: self.keep_disconnected,
            limits: self.limits,
            modules,
        }
    }

    /// Durable record of this tester.
    pub fn store_data(&self) -> StoredResource {
        StoredResource {
            id: self.id.clone(),
            product: self.product,
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            name: self.name.clone(),
            keep_disconnected: self.keep_disconnected,
        }
    }
}

/// Read model of a tester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesterInfo {
    pub id: ResourceId,
    pub product: ProductType,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub index: usize,
    pub reserved_by: String,
    pub is_connected: bool,
    pub keep_disconnected: bool,
    #[serde(flatten)]
    pub limits: TesterLimits,
    pub modules: Vec<ModuleInfo>,
}

/// Read model of a module; `id` is `"<tester>-<module>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub id: String,
    #[serde(flatten)]
    pub state: ModuleState,
    pub ports: Vec<PortInfo>,
}

/// Read model of a port; `id` is `"<tester>-<module>-<port>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub id: String,
    #[serde(flatten)]
    pub state: PortState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::transport::ModuleSnapshot;

    fn snapshot() -> TesterSnapshot {
        TesterSnapshot {
            name: "bench-1".into(),
            reserved_by: String::new(),
            limits: TesterLimits {
                max_name_len: 50,
                max_comment_len: 50,
                max_password_len: 32,
            },
            modules: vec![
                ModuleSnapshot {
                    state: ModuleState {
                        index: 0,
                        model: "M1".into(),
                        ..Default::default()
                    },
                    ports: (0..2)
                        .map(|i| PortState {
                            index: i,
                            ..Default::default()
                        })
                        .collect(),
                },
                ModuleSnapshot {
                    state: ModuleState {
                        index: 3,
                        ..Default::default()
                    },
                    ports: vec![PortState::default()],
                },
            ],
        }
    }

    fn dataset() -> ResourceDataset {
        let creds = Credentials::new(ProductType::Valkyrie, "10.0.0.2");
        ResourceDataset::new(&creds, None)
    }

    #[test]
    fn test_new_dataset_is_offline_and_unnamed() {
        let ds = dataset();
        assert_eq!(ds.name, UNNAMED);
        assert!(!ds.is_connected);
        assert_eq!(ds.modules_len(), 0);
    }

    #[test]
    fn test_snapshot_builds_nested_info() {
        let mut ds = dataset();
        ds.apply_snapshot(snapshot(), true);

        let info = ds.info();
        assert!(info.is_connected);
        assert_eq!(info.name, "bench-1");
        assert_eq!(info.modules.len(), 2);
        assert_eq!(info.modules[0].ports.len(), 2);
        assert_eq!(info.modules[0].ports[1].id, format!("{}-0-1", ds.id));
        assert_eq!(info.modules[1].id, format!("{}-3", ds.id));
        assert_eq!(info.modules[1].ports.len(), 1);
    }

    #[test]
    fn test_changes_address_arena_records() {
        let mut ds = dataset();
        ds.apply_snapshot(snapshot(), true);

        assert!(ds.apply_change(&SessionChange::Traffic {
            module: 0,
            port: 1,
            on: true
        }));
        assert!(ds.apply_change(&SessionChange::ModuleReservedBy {
            module: 3,
            username: "alice".into()
        }));
        assert!(!ds.apply_change(&SessionChange::Sync {
            module: 9,
            port: 0,
            in_sync: true
        }));

        let info = ds.info();
        assert_eq!(info.modules[0].ports[1].state.traffic_on, Some(true));
        assert_eq!(info.modules[1].state.reserved_by, "alice");
    }

    #[test]
    fn test_reset_connection_clears_device_state() {
        let mut ds = dataset();
        ds.apply_snapshot(snapshot(), true);
        ds.reset_connection();
        let info = ds.info();
        assert!(!info.is_connected);
        assert!(info.modules.is_empty());
        assert_eq!(info.name, "bench-1");
    }

    #[test]
    fn test_info_excludes_password() {
        let ds = dataset();
        let json = serde_json::to_string(&ds.info()).unwrap();
        assert!(!json.contains("xena"));
        assert!(json.contains("max_name_len"));
    }
}
