//! Config and state path resolution helpers.

use std::path::PathBuf;

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dir.join("hoist").join("hoist.toml"))
}

pub fn default_state_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine state directory"))?;
    Ok(dir.join("hoist"))
}
