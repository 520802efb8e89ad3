//! Shared service types passed between the resolver, the backends and the presenters.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata key holding the backend-observed status.
pub const META_STATUS: &str = "status";
/// Metadata key holding the build identifier or timestamp.
pub const META_BUILD: &str = "build";
pub const META_OWNER: &str = "owner";
pub const META_GROUP: &str = "group";
/// Metadata key used by `ReadQuery::kind` filtering.
pub const META_TYPE: &str = "type";
/// Kind of services managed by the runtime itself rather than by users.
pub const RUNTIME_KIND: &str = "runtime";

/// Canonical description of a service for one command invocation.
///
/// `metadata` is populated by backends on read and is never written by
/// the orchestration layer. Unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ServiceDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Look up a metadata value, treating a missing key as empty.
    pub fn meta(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Ordered `KEY=VALUE` entries handed to the backend at create time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionEnvironment(Vec<String>);

impl ExecutionEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.0.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ExecutionEnvironment {
    fn from(entries: Vec<String>) -> Self {
        Self(entries)
    }
}

/// Backend-specific execution command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecCommand {
    pub args: Vec<String>,
    /// Working directory for the command; `None` means the caller's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl ExecCommand {
    pub fn new(args: Vec<String>) -> Self {
        Self { args, dir: None }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// The final argument, i.e. what the command was pointed at.
    pub fn target(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

/// Options passed along with a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptions {
    pub command: ExecCommand,
    pub env: ExecutionEnvironment,
}

/// Filter for backend reads. Every unset field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadQuery {
    pub service: Option<String>,
    pub version: Option<String>,
    pub kind: Option<String>,
}

impl ReadQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by service name; an empty name leaves the filter unset.
    pub fn with_service(mut self, name: impl Into<String>) -> Self {
        self.service = non_empty(name.into());
        self
    }

    /// Filter by version; an empty version leaves the filter unset.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = non_empty(version.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = non_empty(kind.into());
        self
    }

    pub fn matches(&self, service: &ServiceDescription) -> bool {
        if let Some(name) = &self.service
            && service.name != *name
        {
            return false;
        }
        if let Some(version) = &self.version
            && service.version != *version
        {
            return false;
        }
        if let Some(kind) = &self.kind
            && service.meta(META_TYPE) != kind
        {
            return false;
        }
        true
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
