#![allow(dead_code)]

pub mod backend;

use std::path::Path;

use hoist_core::config::HoistConfig;
use hoist_core::context::AppContext;

/// Context rooted at `cwd` with local state kept under it.
pub fn context_in(cwd: &Path) -> AppContext {
    let mut config = HoistConfig::default();
    config.local.state_dir = Some(cwd.join(".hoist-state"));
    AppContext::new(config, cwd.to_path_buf())
}
