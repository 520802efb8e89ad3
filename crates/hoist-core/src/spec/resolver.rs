use std::path::Path;

use crate::error::{Error, RUN_USAGE, Result};
use crate::types::{ExecCommand, ServiceDescription};

/// Positional keyword that refers to "the service" rather than a source.
pub const RESERVED_SERVICE_ARG: &str = "service";

/// Raw user intent for a single command invocation.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub args: Vec<String>,
    pub name: String,
    pub version: String,
    pub source: String,
    pub local: bool,
}

impl ResolveRequest {
    /// The source after applying the positional-argument override.
    pub fn effective_source(&self) -> &str {
        match self.args.first() {
            Some(arg) if arg != RESERVED_SERVICE_ARG => arg,
            _ => &self.source,
        }
    }
}

/// Resolve a request into a service description.
///
/// `cwd` is used for name derivation when neither a name nor a source is given.
pub fn resolve(request: &ResolveRequest, cwd: &Path) -> Result<ServiceDescription> {
    let source = request.effective_source().to_string();

    if !request.local && source.is_empty() {
        return Err(Error::MissingSource(RUN_USAGE));
    }

    let name = if request.name.is_empty() {
        derive_name(&source, cwd)
    } else {
        request.name.clone()
    };

    tracing::debug!(
        %name,
        %source,
        version = %request.version,
        local = request.local,
        "resolved service"
    );

    Ok(ServiceDescription::new(name)
        .with_source(source)
        .with_version(request.version.clone()))
}

/// Build the command the backend runs for `service`.
///
/// Relative sources are looked up against `cwd`.
pub fn exec_command(
    service: &ServiceDescription,
    local: bool,
    launcher: &[String],
    cwd: &Path,
) -> ExecCommand {
    let with_target = |target: &str| {
        let mut args = launcher.to_vec();
        args.push(target.to_string());
        ExecCommand::new(args)
    };

    if !local {
        return with_target(&service.source);
    }
    if service.source.is_empty() {
        return with_target(".");
    }

    let dir = cwd.join(&service.source);
    if dir.is_dir() {
        with_target(".").in_dir(dir)
    } else {
        // not on disk, let the launcher fetch it
        tracing::debug!(source = %service.source, "source not on disk, targeting it directly");
        with_target(&service.source)
    }
}

fn derive_name(source: &str, cwd: &Path) -> String {
    if !source.is_empty()
        && let Some(leaf) = Path::new(source).file_name()
    {
        return leaf.to_string_lossy().to_string();
    }
    cwd.file_name()
        .map(|leaf| leaf.to_string_lossy().to_string())
        .unwrap_or_else(|| cwd.display().to_string())
}
