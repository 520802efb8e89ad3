//! Configuration for hoist.
//!
//! Loaded from `hoist.toml` in the user config directory. Every field has a
//! default so a missing file is a valid configuration.

pub mod paths;
pub mod store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use paths::{default_config_path, default_state_dir};
pub use store::ConfigStore;

/// Ambient variables with this prefix are forwarded to spawned services.
pub const DEFAULT_ENV_PREFIX: &str = "HOIST_";
/// Overrides `[remote] address` when set.
pub const RUNTIME_ADDRESS_ENV: &str = "HOIST_RUNTIME_ADDRESS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoistConfig {
    pub env_prefix: String,
    pub local: LocalConfig,
    pub remote: RemoteConfig,
}

impl Default for HoistConfig {
    fn default() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            local: LocalConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl HoistConfig {
    /// Apply overrides taken from the process environment.
    pub fn apply_env_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if key == RUNTIME_ADDRESS_ENV && !value.trim().is_empty() {
                tracing::debug!(address = %value, "remote address overridden from environment");
                self.remote.address = value.trim().to_string();
            }
        }
    }

    /// State directory for the local backend, falling back to the platform default.
    pub fn state_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.local.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_state_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Command prefix used to run a service; the target is appended.
    pub launcher: Vec<String>,
    pub state_dir: Option<PathBuf>,
    /// Interval between source scans of the change notifier.
    pub poll_interval_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            launcher: vec!["go".to_string(), "run".to_string()],
            state_dir: None,
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the runtime management service.
    pub address: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8088".to_string(),
            timeout_secs: 30,
        }
    }
}
