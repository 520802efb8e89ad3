//! Application context shared by the commands.

use std::path::{Path, PathBuf};

use crate::config::{ConfigStore, HoistConfig};
use crate::error::{Error, Result};

/// Configuration and working directory for one command invocation.
///
/// Frontends build this once and hand it to each command.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: HoistConfig,
    cwd: PathBuf,
}

impl AppContext {
    pub fn new(config: HoistConfig, cwd: PathBuf) -> Self {
        Self { config, cwd }
    }

    /// Load configuration from `config_path` (or the default location),
    /// apply environment overrides and capture the current directory.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let store = match config_path {
            Some(path) => ConfigStore::from_path(path),
            None => ConfigStore::from_default_path().map_err(Error::Config)?,
        };
        let mut config = store.load().map_err(Error::Config)?;
        config.apply_env_overrides(std::env::vars());
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(anyhow::anyhow!("Could not read current directory: {e}")))?;
        Ok(Self::new(config, cwd))
    }

    pub fn config(&self) -> &HoistConfig {
        &self.config
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}
