//! Config store for loading and saving hoist.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{HoistConfig, paths::default_config_path};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn from_default_path() -> anyhow::Result<Self> {
        Ok(Self::from_path(default_config_path()?))
    }

    pub fn from_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<HoistConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(HoistConfig::default());
        }
        let content = std::fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;
        toml::from_str(&content).with_context(|| {
            format!("Failed to parse config file: {}", self.config_path.display())
        })
    }

    pub fn save(&self, config: &HoistConfig) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
