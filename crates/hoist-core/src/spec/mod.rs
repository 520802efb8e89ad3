//! Service intent resolution.
//!
//! Turns the raw command input (positional arguments, `--name`, `--version`,
//! `--source` and the local flag) into a [`ServiceDescription`] and the
//! backend-specific [`ExecCommand`] used to run it.
//!
//! ## Rules
//!
//! - A positional argument other than the reserved word `service` is the source.
//! - Without `--name`, the name is the last path segment of the source, or of
//!   the current directory when no source is given.
//! - Local mode treats the source as a directory; when it does not exist the
//!   command targets the source directly so the launcher can fetch it.
//! - Remote mode requires a source.
//!
//! [`ServiceDescription`]: crate::types::ServiceDescription
//! [`ExecCommand`]: crate::types::ExecCommand

mod resolver;


pub use resolver::{RESERVED_SERVICE_ARG, ResolveRequest, exec_command, resolve};
