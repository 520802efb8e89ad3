//! `ps` / `get`: list or read services and render them as a table.

use super::first_is_service;
use crate::backend::{self, BackendKind, BackendSelector, RuntimeBackend};
use crate::context::AppContext;
use crate::error::Result;
use crate::lifecycle::LifecycleController;
use crate::table;
use crate::types::{RUNTIME_KIND, ReadQuery, ServiceDescription};

#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub args: Vec<String>,
    pub name: String,
    pub version: String,
    pub local: bool,
    /// Only show services managed by the runtime itself.
    pub runtime: bool,
}

impl GetOptions {
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

    pub fn with_runtime(mut self, runtime: bool) -> Self {
        self.runtime = runtime;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetReport {
    pub services: Vec<ServiceDescription>,
}

impl GetReport {
    /// Table of the services, empty when there are none.
    pub fn table(&self) -> String {
        table::render(&self.services)
    }
}

/// What a get invocation asks the backend for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lookup {
    List,
    Read(ReadQuery),
}

#[derive(Debug, Clone)]
pub struct GetCommand {
    context: AppContext,
}

impl GetCommand {
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    pub fn execute(&self, options: &GetOptions) -> Result<GetReport> {
        let lookup = lookup(options);
        let mut backend = BackendSelector::new(self.context.config())
            .select(BackendKind::from_local_flag(options.local))?;
        fetch(lookup, backend.as_mut())
    }

    pub fn execute_with(
        &self,
        options: &GetOptions,
        backend: &mut dyn RuntimeBackend,
    ) -> Result<GetReport> {
        fetch(lookup(options), backend)
    }
}

/// Without the `service` keyword every service is listed (runtime-kind only
/// when the flag is set). With it, name and version narrow the read; an empty
/// name still lists.
fn lookup(options: &GetOptions) -> Lookup {
    let kind = if options.runtime { RUNTIME_KIND } else { "" };
    let mut query = ReadQuery::new().with_kind(kind);
    if first_is_service(&options.args) {
        query = query
            .with_service(options.name.clone())
            .with_version(options.version.clone());
    }

    if query == ReadQuery::default() {
        Lookup::List
    } else {
        Lookup::Read(query)
    }
}

fn fetch(lookup: Lookup, backend: &mut dyn RuntimeBackend) -> Result<GetReport> {
    backend::start(backend)?;
    let controller = LifecycleController::new(backend);
    let services = match lookup {
        Lookup::List => controller.list()?,
        Lookup::Read(query) => controller.read(&query)?,
    };
    Ok(GetReport { services })
}
