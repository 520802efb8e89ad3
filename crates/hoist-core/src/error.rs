//! Error kinds surfaced by hoist commands.
//!
//! Backends report failures as `anyhow::Error`; the command layer wraps them
//! into the variant matching the step that failed. Every error is terminal
//! to the current invocation.

/// Usage printed when `run` is missing its input.
pub const RUN_USAGE: &str =
    "Required usage: hoist run service --name example --version latest --source path/or/module";
/// Usage printed when `kill` is missing its input.
pub const KILL_USAGE: &str =
    "Required usage: hoist kill service --name example (optional: --version latest)";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required input was not supplied; carries the usage text.
    #[error("{0}")]
    MissingArguments(&'static str),

    /// A remote create was requested without a source.
    #[error("{0}")]
    MissingSource(&'static str),

    #[error("Could not start: {0:#}")]
    BackendStart(anyhow::Error),

    /// Create/Delete/List/Read failed; the backend message is kept verbatim.
    #[error("{0:#}")]
    BackendOperation(anyhow::Error),

    #[error("Could not start notifier: {0:#}")]
    NotifierInit(anyhow::Error),

    #[error("Could not wait for shutdown signal: {0:#}")]
    Signal(anyhow::Error),

    #[error("Could not load configuration: {0:#}")]
    Config(anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
