//! Hoist - service lifecycle manager
//!
//! Usage:
//!   hoist run service --source github.com/acme/svc   # run on the runtime service
//!   hoist run --local                                # run the current directory locally
//!   hoist kill service --name svc                    # delete a service
//!   hoist ps                                         # list services

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoist_core::commands::{
    GetCommand, GetOptions, KillCommand, KillOptions, RunCommand, RunOptions,
};
use hoist_core::context::AppContext;
use hoist_core::error::Error;

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Run, stop and inspect services", long_about = None)]
struct Cli {
    /// Path to hoist.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a service
    ///
    /// The first argument is either the keyword `service` or the source to run.
    Run(RunArgs),

    /// Kill a service
    Kill(KillArgs),

    /// List services, or show one with `ps service --name <name>`
    #[command(alias = "get")]
    Ps(PsArgs),
}

#[derive(Args)]
struct RunArgs {
    /// `service` or the service source
    args: Vec<String>,
    /// Service name (defaults to the last segment of the source)
    #[arg(long, default_value = "")]
    name: String,
    /// Service version
    #[arg(long, default_value = "")]
    version: String,
    /// Local path or module reference of the service source
    #[arg(long, default_value = "")]
    source: String,
    /// Environment variables, repeatable or comma separated (KEY=VALUE)
    #[arg(long, value_name = "KEY=VALUE")]
    env: Vec<String>,
    /// Run on this host instead of the runtime service
    #[arg(long)]
    local: bool,
}

#[derive(Args)]
struct KillArgs {
    /// Must be `service`
    args: Vec<String>,
    /// Service name
    #[arg(long, default_value = "")]
    name: String,
    /// Service version (all versions when omitted)
    #[arg(long, default_value = "")]
    version: String,
    /// Use the local backend
    #[arg(long)]
    local: bool,
}

#[derive(Args)]
struct PsArgs {
    /// `service` to query a single service
    args: Vec<String>,
    /// Service name
    #[arg(long, default_value = "")]
    name: String,
    /// Service version
    #[arg(long, default_value = "")]
    version: String,
    /// Use the local backend
    #[arg(long)]
    local: bool,
    /// Only show services managed by the runtime itself
    #[arg(long)]
    runtime: bool,
}

fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoist_core=info,hoist=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Failures are reported on stdout and the command simply returns
    if let Err(err) = run_cli(cli) {
        println!("{err}");
    }

    Ok(())
}

fn run_cli(cli: Cli) -> Result<(), Error> {
    let context = AppContext::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => run_service(context, args),
        Commands::Kill(args) => kill_service(context, args),
        Commands::Ps(args) => get_service(context, args),
    }
}

fn run_service(context: AppContext, args: RunArgs) -> Result<(), Error> {
    let mut options = RunOptions::new(args.args)
        .with_name(args.name)
        .with_version(args.version)
        .with_source(args.source)
        .with_local(args.local);
    for env in args.env {
        options = options.with_env(env);
    }

    let report = RunCommand::new(context).execute(&options)?;
    tracing::debug!(service = %report.service.name, shutdown = ?report.shutdown, "run finished");
    Ok(())
}

fn kill_service(context: AppContext, args: KillArgs) -> Result<(), Error> {
    let options = KillOptions::new(args.args)
        .with_name(args.name)
        .with_version(args.version)
        .with_local(args.local);

    KillCommand::new(context).execute(&options)?;
    Ok(())
}

fn get_service(context: AppContext, args: PsArgs) -> Result<(), Error> {
    let options = GetOptions::new(args.args)
        .with_name(args.name)
        .with_version(args.version)
        .with_local(args.local)
        .with_runtime(args.runtime);

    let report = GetCommand::new(context).execute(&options)?;
    print!("{}", report.table());
    Ok(())
}
