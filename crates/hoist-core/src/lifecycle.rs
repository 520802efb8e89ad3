//! Lifecycle operations against a selected backend.
//!
//! Each call is a single round-trip. Failures come back as
//! [`Error::BackendOperation`] with the backend's message untouched.

use crate::backend::RuntimeBackend;
use crate::error::{Error, Result};
use crate::types::{
    CreateOptions, ExecCommand, ExecutionEnvironment, ReadQuery, ServiceDescription,
};

pub struct LifecycleController<'a> {
    backend: &'a dyn RuntimeBackend,
}

impl<'a> LifecycleController<'a> {
    pub fn new(backend: &'a dyn RuntimeBackend) -> Self {
        Self { backend }
    }

    pub fn create(
        &self,
        service: &ServiceDescription,
        command: ExecCommand,
        env: ExecutionEnvironment,
    ) -> Result<()> {
        tracing::info!(
            service = %service.name,
            command = %command.args.join(" "),
            "creating service"
        );
        let options = CreateOptions { command, env };
        self.backend
            .create(service, &options)
            .map_err(Error::BackendOperation)
    }

    /// Delete by name; an empty version matches every version.
    pub fn delete(&self, service: &ServiceDescription) -> Result<()> {
        tracing::info!(service = %service.name, version = %service.version, "deleting service");
        self.backend.delete(service).map_err(Error::BackendOperation)
    }

    pub fn list(&self) -> Result<Vec<ServiceDescription>> {
        self.backend.list().map_err(Error::BackendOperation)
    }

    /// Read services matching `query`. A query with no filters is a list.
    pub fn read(&self, query: &ReadQuery) -> Result<Vec<ServiceDescription>> {
        if *query == ReadQuery::default() {
            return self.list();
        }
        tracing::debug!(?query, "reading services");
        self.backend.read(query).map_err(Error::BackendOperation)
    }
}
