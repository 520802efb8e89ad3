//! High-level commands for hoist operations.
//!
//! Each command resolves its input, selects a backend and drives it through
//! the lifecycle controller. `execute` uses the configured backends and OS
//! signals; `execute_with` takes them from the caller.

pub mod get;
pub mod kill;
pub mod run;

pub use get::{GetCommand, GetOptions, GetReport};
pub use kill::{KillCommand, KillOptions, KillReport};
pub use run::{RunCommand, RunOptions, RunReport};

pub(crate) fn first_is_service(args: &[String]) -> bool {
    args.first()
        .is_some_and(|arg| arg == crate::spec::RESERVED_SERVICE_ARG)
}
