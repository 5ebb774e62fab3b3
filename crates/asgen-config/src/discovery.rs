//! Loading the JSON config file and applying CLI overrides (spec §6:
//! "CLI flags > config file > defaults").

use crate::error::ConfigError;
use crate::model::{Backend, Config};
use asgen_utils::types::MetadataType;
use camino::{Utf8Path, Utf8PathBuf};

impl Config {
    /// Read and parse the config file at `path`, then run
    /// cross-field validation.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;
        config.validate()?;
        Ok(config)
    }
}

/// The subset of `Config` fields the CLI can override (spec §6). Every
/// field left `None` falls through to the config file's value, which
/// in turn falls through to `Config`'s own defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace_dir: Option<Utf8PathBuf>,
    pub backend: Option<Backend>,
    pub metadata_type: Option<MetadataType>,
}

impl Config {
    /// Apply CLI overrides on top of a loaded (or default) config.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workspace_dir) = overrides.workspace_dir {
            self.workspace_dir = workspace_dir;
        }
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        if let Some(metadata_type) = overrides.metadata_type {
            self.metadata_type = Some(metadata_type);
        }
        self
    }
}
