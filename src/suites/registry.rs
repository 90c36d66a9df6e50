//! # Plugin registry: name → loaded plugin.
//!
//! ```text
//! register_path(p) ─► paths += abs(p) ─► reload()
//! reload():  for p in paths: load_plugins(p) ─► suites[meta.name] = data
//! get_plugin(name) ─► version gate ─► Plugin
//! ```
//!
//! ## Rules
//! - Paths are kept in registration order; later paths override earlier
//!   suites with the same name.
//! - A path whose first load fails is not kept.
//! - A failed reload leaves the previous suite map in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::catalog::PluginCatalog;
use super::error::PluginError;
use super::loader::load_plugins;
use super::meta::PublicMeta;
use super::plugin::{DEFAULT_USERNAME, Plugin, PluginData};

/// Public description of a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteInfo {
    pub meta: PublicMeta,
    /// Schema of the whole raw configuration, envelope included.
    pub schema: Value,
}

/// Version the crate reports to plugins by default.
pub fn core_version() -> Version {
    Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| Version::new(0, 1, 0))
}

pub struct PluginRegistry {
    catalog: PluginCatalog,
    core_version: Version,
    paths: RwLock<Vec<PathBuf>>,
    suites: RwLock<BTreeMap<String, PluginData>>,
}

impl PluginRegistry {
    pub fn new(catalog: PluginCatalog, core_version: Version) -> Self {
        Self {
            catalog,
            core_version,
            paths: RwLock::new(Vec::new()),
            suites: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn core_version(&self) -> &Version {
        &self.core_version
    }

    /// Adds a plugins directory and reloads every registered path.
    pub fn register_path(&self, path: impl AsRef<Path>) -> Result<(), PluginError> {
        let path = path.as_ref();
        let abs = std::path::absolute(path).map_err(|source| PluginError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let added = {
            let mut paths = self.paths.write();
            if paths.contains(&abs) {
                false
            } else {
                paths.push(abs.clone());
                true
            }
        };

        let res = self.reload();
        if res.is_err() && added {
            self.paths.write().retain(|p| p != &abs);
        }
        res
    }

    /// Rebuilds the suite map from every registered path.
    pub fn reload(&self) -> Result<(), PluginError> {
        let paths = self.paths.read().clone();
        let mut suites = BTreeMap::new();
        for path in &paths {
            for data in load_plugins(path, &self.catalog)? {
                suites.insert(data.meta.name.clone(), data);
            }
        }
        tracing::debug!(paths = paths.len(), suites = suites.len(), "plugins reloaded");
        *self.suites.write() = suites;
        Ok(())
    }

    /// Names of every loaded suite, sorted.
    pub fn available_test_suites(&self) -> Vec<String> {
        self.suites.read().keys().cloned().collect()
    }

    pub fn suite_info(&self, name: &str) -> Result<SuiteInfo, PluginError> {
        let suites = self.suites.read();
        let data = suites.get(name).ok_or_else(|| PluginError::TestSuiteNotExist {
            name: name.to_string(),
        })?;
        Ok(SuiteInfo {
            meta: data.meta.public(),
            schema: envelope_schema(data.model.schema()),
        })
    }

    /// Loaded data of a suite supporting the running core version.
    pub fn get_plugin_data(&self, name: &str) -> Result<PluginData, PluginError> {
        let data = self
            .suites
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::TestSuiteNotExist {
                name: name.to_string(),
            })?;
        if !data.meta.is_supported(&self.core_version) {
            return Err(PluginError::TestSuiteVersion {
                name: name.to_string(),
                required: data.meta.core_version.to_string(),
                current: self.core_version.to_string(),
            });
        }
        Ok(data)
    }

    pub fn get_plugin(&self, name: &str, debug: bool) -> Result<Plugin, PluginError> {
        Ok(Plugin::new(self.get_plugin_data(name)?, debug))
    }
}

fn envelope_schema(model: &Value) -> Value {
    json!({
        "type": "object",
        "properties": {
            "username": { "type": "string", "default": DEFAULT_USERNAME },
            "port_identities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "tester_id": { "type": "string" },
                        "tester_index": { "type": "integer" },
                        "module_index": { "type": "integer" },
                        "port_index": { "type": "integer" }
                    },
                    "required": ["tester_id", "tester_index", "module_index", "port_index"]
                }
            },
            "config": model
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suites::{ConfigSchema, SuiteFn};

    fn registry(core: Version) -> PluginRegistry {
        let catalog = PluginCatalog::new()
            .with_entry("Echo", SuiteFn::factory(|_| async { Ok(()) }))
            .with_model("EchoConfig", ConfigSchema::any_object());
        PluginRegistry::new(catalog, core)
    }

    fn write_plugin(root: &Path, dir: &str, name: &str, core: &str) {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).unwrap();
        let meta = format!(
            "name: {name}\nversion: 1.0.0\ncore_version: '{core}'\nauthor: [qa]\nentry_object: Echo\ndata_model: EchoConfig\n"
        );
        std::fs::write(path.join("meta.yml"), meta).unwrap();
    }

    #[test]
    fn test_register_path_loads_suites() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "b", "BETA", "*");
        write_plugin(root.path(), "a", "ALPHA", "*");

        let reg = registry(Version::new(1, 0, 0));
        reg.register_path(root.path()).unwrap();
        assert_eq!(reg.available_test_suites(), vec!["ALPHA", "BETA"]);

        let info = reg.suite_info("ALPHA").unwrap();
        assert_eq!(info.meta.version, "1.0.0");
        assert_eq!(info.schema["properties"]["config"]["type"], "object");
        assert_eq!(
            info.schema["properties"]["username"]["default"],
            DEFAULT_USERNAME
        );
    }

    #[test]
    fn test_reload_picks_up_new_plugins() {
        let root = tempfile::tempdir().unwrap();
        let reg = registry(Version::new(1, 0, 0));
        reg.register_path(root.path()).unwrap();
        assert!(reg.available_test_suites().is_empty());

        write_plugin(root.path(), "echo", "ECHO", "*");
        reg.reload().unwrap();
        assert_eq!(reg.available_test_suites(), vec!["ECHO"]);
    }

    #[test]
    fn test_failed_path_is_not_kept() {
        let root = tempfile::tempdir().unwrap();
        let reg = registry(Version::new(1, 0, 0));
        assert!(reg.register_path(root.path().join("absent")).is_err());

        write_plugin(root.path(), "echo", "ECHO", "*");
        reg.register_path(root.path()).unwrap();
        assert_eq!(reg.available_test_suites(), vec!["ECHO"]);
    }

    #[test]
    fn test_unknown_and_unsupported_suites() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "old", "OLD", ">=2.0.0");

        let reg = registry(Version::new(1, 0, 0));
        reg.register_path(root.path()).unwrap();

        assert!(matches!(
            reg.get_plugin("MISSING", false),
            Err(PluginError::TestSuiteNotExist { .. })
        ));
        assert!(matches!(
            reg.get_plugin("OLD", false),
            Err(PluginError::TestSuiteVersion { .. })
        ));
        assert!(reg.suite_info("OLD").is_ok());
    }
}
