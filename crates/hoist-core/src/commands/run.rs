//! `run`: create a service and, in local mode, tear it down on signal.

use crate::backend::{self, BackendKind, BackendSelector, RuntimeBackend};
use crate::context::AppContext;
use crate::env::compose_from_process;
use crate::error::{Error, RUN_USAGE, Result};
use crate::lifecycle::LifecycleController;
use crate::shutdown::{OsSignals, ShutdownCoordinator, ShutdownState, SignalSource};
use crate::spec::{ResolveRequest, exec_command, resolve};
use crate::types::{ExecCommand, ExecutionEnvironment, ServiceDescription};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Positional arguments; `service` or a source.
    pub args: Vec<String>,
    pub name: String,
    pub version: String,
    pub source: String,
    /// Raw `--env` values, each possibly a comma separated list.
    pub env: Vec<String>,
    pub local: bool,
}

impl RunOptions {
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

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env.push(env.into());
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    fn request(&self) -> ResolveRequest {
        ResolveRequest {
            args: self.args.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            source: self.source.clone(),
            local: self.local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub service: ServiceDescription,
    pub command: ExecCommand,
    pub local: bool,
    /// Final shutdown state for local runs.
    pub shutdown: Option<ShutdownState>,
}

struct Prepared {
    service: ServiceDescription,
    command: ExecCommand,
    env: ExecutionEnvironment,
}

#[derive(Debug, Clone)]
pub struct RunCommand {
    context: AppContext,
}

impl RunCommand {
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    pub fn execute(&self, options: &RunOptions) -> Result<RunReport> {
        let prepared = self.prepare(options)?;
        let selector = BackendSelector::new(self.context.config());
        let mut backend = selector.select_for_run(
            BackendKind::from_local_flag(options.local),
            &prepared.service,
            self.context.cwd(),
        )?;

        if options.local {
            // registered before create so an early signal is not lost
            let mut os_signals = OsSignals::register().map_err(Error::Signal)?;
            let signals: &mut dyn SignalSource = &mut os_signals;
            self.drive(options.local, prepared, backend.as_mut(), Some(signals))
        } else {
            self.drive(options.local, prepared, backend.as_mut(), None)
        }
    }

    /// Run against a caller-provided backend and signal source.
    pub fn execute_with(
        &self,
        options: &RunOptions,
        backend: &mut dyn RuntimeBackend,
        signals: &mut dyn SignalSource,
    ) -> Result<RunReport> {
        let prepared = self.prepare(options)?;
        self.drive(options.local, prepared, backend, Some(signals))
    }

    fn prepare(&self, options: &RunOptions) -> Result<Prepared> {
        if options.args.is_empty() && options.name.is_empty() && options.source.is_empty() {
            return Err(Error::MissingArguments(RUN_USAGE));
        }

        let config = self.context.config();
        let cwd = self.context.cwd();
        let service = resolve(&options.request(), cwd)?;
        let command = exec_command(&service, options.local, &config.local.launcher, cwd);
        let env = compose_from_process(&options.env, &config.env_prefix);

        Ok(Prepared {
            service,
            command,
            env,
        })
    }

    fn drive(
        &self,
        local: bool,
        prepared: Prepared,
        backend: &mut dyn RuntimeBackend,
        signals: Option<&mut dyn SignalSource>,
    ) -> Result<RunReport> {
        let Prepared {
            service,
            command,
            env,
        } = prepared;

        backend::start(backend)?;
        LifecycleController::new(backend).create(&service, command.clone(), env)?;

        let mut report = RunReport {
            service,
            command,
            local,
            shutdown: None,
        };
        if !local {
            return Ok(report);
        }

        let signals = signals
            .ok_or_else(|| Error::Signal(anyhow::anyhow!("no signal source for local run")))?;
        let mut coordinator = ShutdownCoordinator::new();
        coordinator.run(backend, &report.service, signals)?;
        report.shutdown = Some(coordinator.state());
        Ok(report)
    }
}
