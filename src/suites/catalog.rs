//! # Plugin catalog: symbol table resolved by plugin descriptors.
//!
//! Suites are compiled into the host binary and registered under symbol
//! names. A plugin directory's `meta.yml` names two symbols: an entry
//! factory and a configuration model. The loader resolves both here.
//!
//! ```text
//! meta.yml { entry_object: "Echo", data_model: "EchoConfig" }
//!                 │                        │
//!                 ▼                        ▼
//! PluginCatalog { "Echo" → Entry(factory), "EchoConfig" → Model(schema) }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::contract::SuiteFactory;

/// Typed configuration of a suite.
pub trait ConfigModel: Serialize + DeserializeOwned {
    /// JSON schema describing the model.
    fn schema() -> Value;
}

type Binder = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Schema plus validation of a configuration model.
#[derive(Clone)]
pub struct ConfigSchema {
    schema: Value,
    bind: Binder,
}

impl ConfigSchema {
    /// Schema of a typed model; binding normalizes through `T`.
    pub fn of<T: ConfigModel>() -> Self {
        Self {
            schema: T::schema(),
            bind: Arc::new(|raw| {
                let model: T = serde_json::from_value(raw).map_err(|e| e.to_string())?;
                serde_json::to_value(model).map_err(|e| e.to_string())
            }),
        }
    }

    /// Accepts any JSON object.
    pub fn any_object() -> Self {
        Self {
            schema: json!({ "type": "object" }),
            bind: Arc::new(|raw| match raw {
                Value::Object(_) => Ok(raw),
                other => Err(format!("expected an object, got {other}")),
            }),
        }
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validates `raw` and returns the normalized configuration.
    pub fn bind(&self, raw: Value) -> Result<Value, String> {
        (self.bind)(raw)
    }
}

impl std::fmt::Debug for ConfigSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSchema").field("schema", &self.schema).finish()
    }
}

/// Resolvable symbol.
#[derive(Clone)]
pub enum Symbol {
    Entry(SuiteFactory),
    Model(ConfigSchema),
}

impl Symbol {
    pub fn kind(&self) -> &'static str {
        match self {
            Symbol::Entry(_) => "entry",
            Symbol::Model(_) => "model",
        }
    }
}

/// Symbol table of every suite linked into the binary.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    symbols: HashMap<String, Symbol>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry factory under `name`.
    pub fn with_entry(mut self, name: impl Into<String>, factory: SuiteFactory) -> Self {
        self.symbols.insert(name.into(), Symbol::Entry(factory));
        self
    }

    /// Registers a configuration model under `name`.
    pub fn with_model(mut self, name: impl Into<String>, schema: ConfigSchema) -> Self {
        self.symbols.insert(name.into(), Symbol::Model(schema));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
