//! Hoist Core Library
//!
//! Service lifecycle orchestration: resolves what to run, composes its
//! environment, selects a local or remote execution backend and drives it
//! through create, read, delete and list. Local runs block until a
//! termination signal and then tear the service down.

pub mod backend;
pub mod commands;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod lifecycle;
pub mod shutdown;
pub mod spec;
pub mod table;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Commands
    pub use crate::commands::{
        GetCommand, GetOptions, GetReport, KillCommand, KillOptions, KillReport, RunCommand,
        RunOptions, RunReport,
    };

    // Backends
    pub use crate::backend::{
        BackendKind, BackendSelector, LocalRuntime, RemoteRuntime, RuntimeBackend,
    };

    // Configuration
    pub use crate::config::{ConfigStore, HoistConfig};
    pub use crate::context::AppContext;

    // Errors
    pub use crate::error::{Error, Result};

    // Types
    pub use crate::types::{
        CreateOptions, ExecCommand, ExecutionEnvironment, ReadQuery, ServiceDescription,
    };
}
