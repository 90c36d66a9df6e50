//! Plugin metadata descriptor (`meta.yml`).

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

/// File name of the descriptor inside a plugin directory.
pub const META_FILE_NAME: &str = "meta.yml";

/// Declared identity and symbols of a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub name: String,
    pub version: Version,
    /// Range of compatible core versions.
    pub core_version: VersionReq,
    #[serde(default)]
    pub author: Option<Vec<String>>,
    /// Symbol of the entry factory.
    pub entry_object: String,
    /// Symbol of the configuration model.
    pub data_model: String,
}

impl PluginMeta {
    /// Parses a YAML descriptor.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// True if `core` satisfies [`PluginMeta::core_version`].
    pub fn is_supported(&self, core: &Version) -> bool {
        self.core_version.matches(core)
    }

    /// Public part of the metadata (without symbol names).
    pub fn public(&self) -> PublicMeta {
        PublicMeta {
            name: self.name.clone(),
            version: self.version.to_string(),
            core_version: self.core_version.to_string(),
            author: self.author.clone(),
        }
    }
}

/// Metadata exposed by `suite_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMeta {
    pub name: String,
    pub version: String,
    pub core_version: String,
    pub author: Option<Vec<String>>,
}
