//! Loads `DeployConfig` from a YAML file on disk.

use std::path::{Path, PathBuf};

use crate::domain::config::{DeployConfig, validate};
use crate::domain::error::ConfigError;

/// File looked for in the working directory when no path is given.
pub const LOCAL_CONFIG: &str = "vpsctl.yaml";

/// Production config loader backed by a YAML file.
pub struct YamlConfigStore {
    explicit: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Use `path` if given, otherwise search the default locations.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { explicit: path }
    }

    /// Where the configuration is read from, if anywhere.
    ///
    /// Order: explicit path (`--config` or `VPSCTL_CONFIG`, resolved by the
    /// CLI), `./vpsctl.yaml`, `~/.vpsctl/config.yaml`. An explicit path is
    /// returned even when it does not exist so that loading reports the error.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            return Some(path.clone());
        }
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return Some(local);
        }
        dirs::home_dir()
            .map(|home| home.join(".vpsctl").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Load and validate the configuration; built-in defaults when no file is found.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(&self) -> Result<DeployConfig, ConfigError> {
        let config = match self.path() {
            Some(path) => read(&path)?,
            None => DeployConfig::default(),
        };
        validate(&config)?;
        Ok(config)
    }
}

fn read(path: &Path) -> Result<DeployConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
