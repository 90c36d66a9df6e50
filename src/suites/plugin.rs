//! # Plugin handle: loaded plugin data plus one execution's parameters.
//!
//! ```text
//! registry.get_plugin(name) ─► Plugin
//!   ├─ parse_config(raw)        bind raw config to the model ─► TestParameters
//!   ├─ assign_testers(resolver) port identities ─► fresh sessions
//!   └─ create_test_suite(conditions, output) ─► Arc<dyn TestSuite>
//! ```
//!
//! Raw configuration is an object with the optional envelope keys
//! `username` and `port_identities`. The suite configuration is either the
//! object under a sole `config` key or all remaining keys.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::ConfigSchema;
use super::contract::{OutputFacade, StateConditionsFacade, SuiteContext, SuiteFactory, TestSuite};
use super::error::PluginError;
use super::meta::PluginMeta;
use crate::resources::{ResourceId, TesterResolver, Testers};

/// Session owner name used when the configuration does not set one.
pub const DEFAULT_USERNAME: &str = "xoa-manager";

/// Everything loaded for one plugin directory.
#[derive(Clone)]
pub struct PluginData {
    pub meta: PluginMeta,
    pub entry: SuiteFactory,
    pub model: ConfigSchema,
    pub path: PathBuf,
}

impl std::fmt::Debug for PluginData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginData")
            .field("meta", &self.meta)
            .field("path", &self.path)
            .finish()
    }
}

/// Port of a tester referenced by a suite configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortIdentity {
    pub tester_id: ResourceId,
    pub tester_index: usize,
    pub module_index: u8,
    pub port_index: u8,
}

impl PortIdentity {
    /// Display name `P-<tester>-<module>-<port>`.
    pub fn name(&self) -> String {
        format!(
            "P-{}-{}-{}",
            self.tester_index, self.module_index, self.port_index
        )
    }
}

/// Parsed parameters of one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestParameters {
    pub username: String,
    pub port_identities: Vec<PortIdentity>,
    /// Configuration bound to the suite's model.
    pub config: Value,
}

impl TestParameters {
    /// Distinct tester ids referenced by the port identities, sorted.
    pub fn tester_ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = self
            .port_identities
            .iter()
            .map(|p| p.tester_id.clone())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Deserializes the configuration into a typed model.
    pub fn config_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.config.clone())
    }
}

/// Runnable handle of a named suite.
pub struct Plugin {
    data: PluginData,
    debug: bool,
    params: Option<TestParameters>,
    testers: Testers,
}

impl Plugin {
    pub fn new(data: PluginData, debug: bool) -> Self {
        Self {
            data,
            debug,
            params: None,
            testers: Testers::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.data.meta.name
    }

    pub fn meta(&self) -> &PluginMeta {
        &self.data.meta
    }

    pub fn params(&self) -> Option<&TestParameters> {
        self.params.as_ref()
    }

    pub fn testers(&self) -> &Testers {
        &self.testers
    }

    /// Binds raw configuration to the suite's model.
    pub fn parse_config(&mut self, raw: Value) -> Result<(), PluginError> {
        let invalid = |reason: String| PluginError::InvalidConfig {
            name: self.data.meta.name.clone(),
            reason,
        };

        let Value::Object(mut raw) = raw else {
            return Err(invalid("configuration must be an object".into()));
        };

        let username = match raw.remove("username") {
            None | Some(Value::Null) => DEFAULT_USERNAME.to_string(),
            Some(Value::String(name)) => name,
            Some(other) => return Err(invalid(format!("username must be a string, got {other}"))),
        };
        let port_identities: Vec<PortIdentity> = match raw.remove("port_identities") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| invalid(format!("port_identities: {e}")))?,
        };

        let config = suite_config(raw);
        let config = self.data.model.bind(config).map_err(invalid)?;

        self.params = Some(TestParameters {
            username,
            port_identities,
            config,
        });
        Ok(())
    }

    /// Resolves the testers referenced by the parsed configuration.
    pub fn assign_testers(&mut self, resolver: &dyn TesterResolver) -> Result<(), PluginError> {
        let params = self.params.as_ref().ok_or_else(|| PluginError::ConfigNotParsed {
            name: self.data.meta.name.clone(),
        })?;
        self.testers = resolver.resolve(&params.tester_ids(), &params.username, self.debug)?;
        Ok(())
    }

    /// Instantiates the entry with its collaborators.
    pub fn create_test_suite(
        self,
        conditions: Arc<dyn StateConditionsFacade>,
        output: Arc<dyn OutputFacade>,
    ) -> Result<Arc<dyn TestSuite>, PluginError> {
        let params = self.params.ok_or_else(|| PluginError::ConfigNotParsed {
            name: self.data.meta.name.clone(),
        })?;
        let ctx = SuiteContext {
            conditions,
            output,
            testers: self.testers,
            params,
        };
        Ok((self.data.entry)(ctx))
    }
}

fn suite_config(mut rest: Map<String, Value>) -> Value {
    if rest.len() == 1
        && let Some(Value::Object(_)) = rest.get("config")
        && let Some(config) = rest.remove("config")
    {
        return config;
    }
    Value::Object(rest)
}
