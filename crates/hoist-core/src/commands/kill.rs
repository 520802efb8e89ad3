//! `kill service --name <name>`: delete a service from its backend.

use super::first_is_service;
use crate::backend::{self, BackendKind, BackendSelector, RuntimeBackend};
use crate::context::AppContext;
use crate::error::{Error, KILL_USAGE, Result};
use crate::lifecycle::LifecycleController;
use crate::types::ServiceDescription;

#[derive(Debug, Clone, Default)]
pub struct KillOptions {
    pub args: Vec<String>,
    pub name: String,
    /// Empty matches every version.
    pub version: String,
    pub local: bool,
}

impl KillOptions {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }
}

#[derive(Debug, Clone)]
pub struct KillReport {
    pub service: ServiceDescription,
}

#[derive(Debug, Clone)]
pub struct KillCommand {
    context: AppContext,
}

impl KillCommand {
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    pub fn execute(&self, options: &KillOptions) -> Result<KillReport> {
        let service = target(options)?;
        let mut backend = BackendSelector::new(self.context.config())
            .select(BackendKind::from_local_flag(options.local))?;
        delete(service, backend.as_mut())
    }

    pub fn execute_with(
        &self,
        options: &KillOptions,
        backend: &mut dyn RuntimeBackend,
    ) -> Result<KillReport> {
        delete(target(options)?, backend)
    }
}

fn target(options: &KillOptions) -> Result<ServiceDescription> {
    if !first_is_service(&options.args) || options.name.is_empty() {
        return Err(Error::MissingArguments(KILL_USAGE));
    }
    Ok(ServiceDescription::new(options.name.clone()).with_version(options.version.clone()))
}

/// Kill never stops the backend, whatever the outcome of the delete.
fn delete(service: ServiceDescription, backend: &mut dyn RuntimeBackend) -> Result<KillReport> {
    backend::start(backend)?;
    LifecycleController::new(backend).delete(&service)?;
    Ok(KillReport { service })
}
