//! Execution backends and their selection.
//!
//! Both backends implement [`RuntimeBackend`]:
//!
//! | Kind   | Runs on            | Notes                                         |
//! |--------|--------------------|-----------------------------------------------|
//! | Local  | the invoking host  | child processes, optional change notifier     |
//! | Remote | runtime service    | JSON over HTTP, reachable once started        |
//!
//! Selection is a plain factory keyed on the local flag. The handle is owned
//! by the command invocation that created it.

pub mod local;
pub mod notifier;
pub mod remote;

use std::path::Path;
use std::time::Duration;

use crate::config::HoistConfig;
use crate::error::{Error, Result};
use crate::types::{CreateOptions, ReadQuery, ServiceDescription};

pub use local::LocalRuntime;
pub use notifier::{Notifier, NotifierEvent, PollingNotifier};
pub use remote::RemoteRuntime;

/// Capability set shared by every backend.
///
/// `start` must succeed before any other call. Errors are reported as-is;
/// callers do not retry.
pub trait RuntimeBackend: Send {
    fn start(&mut self) -> anyhow::Result<()>;

    fn stop(&mut self) -> anyhow::Result<()>;

    fn create(&self, service: &ServiceDescription, options: &CreateOptions) -> anyhow::Result<()>;

    /// Delete by name, and by version when the description carries one.
    fn delete(&self, service: &ServiceDescription) -> anyhow::Result<()>;

    fn list(&self) -> anyhow::Result<Vec<ServiceDescription>>;

    fn read(&self, query: &ReadQuery) -> anyhow::Result<Vec<ServiceDescription>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl BackendKind {
    pub fn from_local_flag(local: bool) -> Self {
        if local { Self::Local } else { Self::Remote }
    }
}

/// Builds backends from configuration.
#[derive(Debug, Clone, Copy)]
pub struct BackendSelector<'a> {
    config: &'a HoistConfig,
}

impl<'a> BackendSelector<'a> {
    pub fn new(config: &'a HoistConfig) -> Self {
        Self { config }
    }

    /// Backend for commands that only inspect or delete services.
    pub fn select(&self, kind: BackendKind) -> Result<Box<dyn RuntimeBackend>> {
        match kind {
            BackendKind::Local => Ok(Box::new(self.local_runtime()?)),
            BackendKind::Remote => Ok(Box::new(RemoteRuntime::new(self.config.remote.clone()))),
        }
    }

    /// Backend for `run`. In local mode a change notifier bound to the service
    /// source is attached so edits restart the service.
    pub fn select_for_run(
        &self,
        kind: BackendKind,
        service: &ServiceDescription,
        cwd: &Path,
    ) -> Result<Box<dyn RuntimeBackend>> {
        match kind {
            BackendKind::Local => {
                let watch_dir = if service.source.is_empty() {
                    cwd.to_path_buf()
                } else {
                    cwd.join(&service.source)
                };
                let notifier = PollingNotifier::new(
                    service.name.clone(),
                    service.version.clone(),
                    watch_dir,
                    Duration::from_millis(self.config.local.poll_interval_ms),
                );
                let runtime = attach_notifier(self.local_runtime()?, Box::new(notifier))?;
                Ok(Box::new(runtime))
            }
            BackendKind::Remote => self.select(kind),
        }
    }

    fn local_runtime(&self) -> Result<LocalRuntime> {
        let state_dir = self.config.state_dir().map_err(Error::Config)?;
        Ok(LocalRuntime::new(state_dir))
    }
}

fn attach_notifier(runtime: LocalRuntime, notifier: Box<dyn Notifier>) -> Result<LocalRuntime> {
    runtime.with_notifier(notifier).map_err(Error::NotifierInit)
}

/// Start a backend, mapping failure to [`Error::BackendStart`].
pub fn start(backend: &mut dyn RuntimeBackend) -> Result<()> {
    backend.start().map_err(Error::BackendStart)
}
