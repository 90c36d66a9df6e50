//! # Plugin discovery.
//!
//! Every direct subdirectory of a plugins path holding a `meta.yml` is a
//! plugin. Its descriptor names the entry and model symbols, which are
//! resolved against the [`PluginCatalog`].
//!
//! ## Rules
//! - Subdirectories without `meta.yml` are skipped.
//! - Subdirectories are visited in name order.
//! - Any broken plugin fails the whole load; nothing is partially applied.

use std::path::{Path, PathBuf};

use super::catalog::{PluginCatalog, Symbol};
use super::error::PluginError;
use super::meta::{META_FILE_NAME, PluginMeta};
use super::plugin::PluginData;

/// Loads every plugin found under `path`.
pub fn load_plugins(path: &Path, catalog: &PluginCatalog) -> Result<Vec<PluginData>, PluginError> {
    let io = |source: std::io::Error| PluginError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io)? {
        let entry = entry.map_err(io)?;
        if entry.file_type().map_err(io)?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut plugins = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if let Some(data) = load_plugin(&dir, catalog)? {
            plugins.push(data);
        }
    }
    Ok(plugins)
}

fn load_plugin(dir: &Path, catalog: &PluginCatalog) -> Result<Option<PluginData>, PluginError> {
    let meta_path = dir.join(META_FILE_NAME);
    if !meta_path.is_file() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(&meta_path).map_err(|source| PluginError::Io {
        path: meta_path.clone(),
        source,
    })?;
    let invalid = |reason: String| PluginError::InvalidPlugin {
        path: dir.to_path_buf(),
        reason,
    };
    let meta = PluginMeta::from_yaml(&text).map_err(|e| invalid(format!("{META_FILE_NAME}: {e}")))?;

    let entry = match catalog.get(&meta.entry_object) {
        Some(Symbol::Entry(factory)) => factory.clone(),
        Some(other) => {
            return Err(invalid(format!(
                "`{}` is a {} symbol, expected an entry",
                meta.entry_object,
                other.kind()
            )));
        }
        None => return Err(invalid(format!("entry `{}` is not registered", meta.entry_object))),
    };
    let model = match catalog.get(&meta.data_model) {
        Some(Symbol::Model(schema)) => schema.clone(),
        Some(other) => {
            return Err(invalid(format!(
                "`{}` is a {} symbol, expected a model",
                meta.data_model,
                other.kind()
            )));
        }
        None => return Err(invalid(format!("model `{}` is not registered", meta.data_model))),
    };

    Ok(Some(PluginData {
        meta,
        entry,
        model,
        path: dir.to_path_buf(),
    }))
}
