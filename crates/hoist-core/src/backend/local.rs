//! Local backend: runs services as child processes of the invoking host.
//!
//! Each created service is recorded as `<state_dir>/services/<name>.json` so
//! other invocations (`ps --local`, `kill --local`) can see it. Children owned
//! by this process are tracked in memory and restarted when the attached
//! notifier reports a source change.
//!
//! A record is only removed by the invocation whose child pid it carries, and
//! a live pid in an existing record blocks a second create of the same name.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::RuntimeBackend;
use super::notifier::{Notifier, NotifierEvent};
use crate::types::{
    CreateOptions, ExecCommand, META_BUILD, META_STATUS, ReadQuery, ServiceDescription,
};

const STATUS_RUNNING: &str = "running";
const STATUS_STOPPED: &str = "stopped";
const STATUS_ERROR: &str = "error";

/// On-disk record of a locally created service.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServiceRecord {
    service: ServiceDescription,
    pid: Option<u32>,
    command: ExecCommand,
    #[serde(default)]
    env: Vec<String>,
}

struct Managed {
    child: Child,
    record: ServiceRecord,
}

#[derive(Default)]
struct LocalState {
    children: HashMap<String, Managed>,
}

pub struct LocalRuntime {
    services_dir: PathBuf,
    state: Arc<Mutex<LocalState>>,
    notifier: Option<Box<dyn Notifier>>,
    stop_flag: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
    started: bool,
}

impl LocalRuntime {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            services_dir: state_dir.join("services"),
            state: Arc::new(Mutex::new(LocalState::default())),
            notifier: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            watcher: None,
            started: false,
        }
    }

    /// Attach a change notifier; it starts watching when the runtime starts.
    pub fn with_notifier(mut self, mut notifier: Box<dyn Notifier>) -> anyhow::Result<Self> {
        notifier.init()?;
        self.notifier = Some(notifier);
        Ok(self)
    }

    pub fn services_dir(&self) -> &Path {
        &self.services_dir
    }

    fn ensure_started(&self) -> anyhow::Result<()> {
        if !self.started {
            anyhow::bail!("local runtime is not started");
        }
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, LocalState>> {
        lock_state(&self.state)
    }
}

impl RuntimeBackend for LocalRuntime {
    fn start(&mut self) -> anyhow::Result<()> {
        if self.started {
            return Ok(());
        }
        std::fs::create_dir_all(&self.services_dir).with_context(|| {
            format!(
                "Failed to create state directory: {}",
                self.services_dir.display()
            )
        })?;

        if let Some(notifier) = self.notifier.take() {
            self.stop_flag.store(false, Ordering::Relaxed);
            let events = notifier.watch(self.stop_flag.clone())?;
            let state = self.state.clone();
            let services_dir = self.services_dir.clone();
            let handle = std::thread::Builder::new()
                .name("hoist-local-watcher".to_string())
                .spawn(move || handle_events(events, &state, &services_dir))
                .context("Failed to spawn watcher thread")?;
            self.watcher = Some(handle);
        }

        self.started = true;
        tracing::debug!(dir = %self.services_dir.display(), "local runtime started");
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        if !self.started {
            return Ok(());
        }
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.watcher.take()
            && handle.join().is_err()
        {
            tracing::warn!("watcher thread panicked");
        }

        let mut failures = Vec::new();
        let mut state = self.lock()?;
        for (name, mut managed) in state.children.drain() {
            if let Err(e) = release(&self.services_dir, &name, &mut managed.child) {
                tracing::warn!(service = %name, "failed to stop service: {e:#}");
                failures.push(format!("{name}: {e:#}"));
            }
        }
        drop(state);
        self.started = false;

        if !failures.is_empty() {
            anyhow::bail!("Failed to stop services: {}", failures.join("; "));
        }
        tracing::debug!("local runtime stopped");
        Ok(())
    }

    fn create(&self, service: &ServiceDescription, options: &CreateOptions) -> anyhow::Result<()> {
        self.ensure_started()?;
        validate_name(&service.name)?;
        validate_env(options.env.entries())?;

        let mut state = self.lock()?;
        if let Some(existing) = state.children.get_mut(&service.name)
            && existing.child.try_wait()?.is_none()
        {
            anyhow::bail!("service {} is already running", service.name);
        }
        if let Some(existing) = read_record(&self.services_dir, &service.name)?
            && let Some(pid) = existing.pid
            && pid_alive(pid)
        {
            anyhow::bail!("service {} is already running (pid {pid})", service.name);
        }

        let mut record = ServiceRecord {
            service: service.clone(),
            pid: None,
            command: options.command.clone(),
            env: options.env.entries().to_vec(),
        };
        let mut child = spawn(&record)?;
        record.pid = Some(child.id());
        mark_running(&mut record.service);
        if let Err(e) = write_record(&self.services_dir, &record) {
            if let Err(kill_err) = terminate_child(&mut child) {
                tracing::warn!(
                    service = %service.name,
                    "failed to stop unrecorded service: {kill_err:#}"
                );
            }
            return Err(e);
        }

        tracing::info!(service = %service.name, pid = child.id(), "service created");
        state
            .children
            .insert(service.name.clone(), Managed { child, record });
        Ok(())
    }

    fn delete(&self, service: &ServiceDescription) -> anyhow::Result<()> {
        self.ensure_started()?;
        validate_name(&service.name)?;
        let query = ReadQuery::new()
            .with_service(service.name.clone())
            .with_version(service.version.clone());
        let record = read_record(&self.services_dir, &service.name)?
            .filter(|record| query.matches(&record.service));

        let mut state = self.lock()?;
        let owned = state
            .children
            .get(&service.name)
            .is_some_and(|managed| query.matches(&managed.record.service));
        if record.is_none() && !owned {
            anyhow::bail!("service {} not found", service.name);
        }

        if owned && let Some(mut managed) = state.children.remove(&service.name) {
            release(&self.services_dir, &service.name, &mut managed.child)?;
        } else if let Some(record) = record {
            match record.pid {
                Some(pid) if pid_alive(pid) => terminate_pid(pid)?,
                _ => tracing::debug!(service = %service.name, "process already gone"),
            }
            remove_record_of(&self.services_dir, &service.name, record.pid)?;
        }

        tracing::info!(service = %service.name, "service deleted");
        Ok(())
    }

    fn list(&self) -> anyhow::Result<Vec<ServiceDescription>> {
        self.ensure_started()?;
        let mut state = self.lock()?;
        let mut services = Vec::new();
        for record in load_records(&self.services_dir)? {
            let mut service = record.service;
            let observed = match state.children.get_mut(&service.name) {
                Some(managed) if Some(managed.child.id()) == record.pid => {
                    managed.child.try_wait()?.map(|status| {
                        if status.success() {
                            STATUS_STOPPED
                        } else {
                            STATUS_ERROR
                        }
                    })
                }
                _ => match record.pid {
                    Some(pid) if !pid_alive(pid) => Some(STATUS_STOPPED),
                    _ => None,
                },
            };
            if let Some(observed) = observed {
                service
                    .metadata
                    .insert(META_STATUS.to_string(), observed.to_string());
            }
            services.push(service);
        }
        Ok(services)
    }

    fn read(&self, query: &ReadQuery) -> anyhow::Result<Vec<ServiceDescription>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|service| query.matches(service))
            .collect())
    }
}

impl Drop for LocalRuntime {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

fn lock_state(state: &Mutex<LocalState>) -> anyhow::Result<MutexGuard<'_, LocalState>> {
    state
        .lock()
        .map_err(|_| anyhow::anyhow!("local runtime state is poisoned"))
}

fn handle_events(events: Receiver<NotifierEvent>, state: &Mutex<LocalState>, services_dir: &Path) {
    for event in events {
        if let Err(e) = restart(state, services_dir, &event.service) {
            tracing::warn!(service = %event.service, "restart after source change failed: {e:#}");
        }
    }
}

fn restart(state: &Mutex<LocalState>, services_dir: &Path, name: &str) -> anyhow::Result<()> {
    let mut state = lock_state(state)?;
    let Some(managed) = state.children.get_mut(name) else {
        return Ok(());
    };

    terminate_child(&mut managed.child)?;
    let child = spawn(&managed.record)?;
    managed.record.pid = Some(child.id());
    mark_running(&mut managed.record.service);
    managed.child = child;
    write_record(services_dir, &managed.record)?;

    tracing::info!(service = %name, pid = managed.child.id(), "service restarted");
    Ok(())
}

fn spawn(record: &ServiceRecord) -> anyhow::Result<Child> {
    let (program, args) = record
        .command
        .args
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("service {} has an empty command", record.service.name))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for entry in &record.env {
        if let Some((key, value)) = entry.split_once('=') {
            command.env(key, value);
        }
    }
    if let Some(dir) = &record.command.dir {
        command.current_dir(dir);
    }

    command.spawn().with_context(|| {
        format!(
            "Failed to run {} for service {}",
            record.command.args.join(" "),
            record.service.name
        )
    })
}

/// Service names become record file names and must stay a single component.
fn validate_name(name: &str) -> anyhow::Result<()> {
    let mut components = Path::new(name).components();
    let is_leaf = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    );
    if !is_leaf || name.contains(['/', '\\']) {
        anyhow::bail!("invalid service name '{name}': must not contain path separators");
    }
    Ok(())
}

fn validate_env(entries: &[String]) -> anyhow::Result<()> {
    for entry in entries {
        match entry.split_once('=') {
            Some((key, _)) if !key.is_empty() => {}
            _ => anyhow::bail!("invalid environment entry '{entry}': expected KEY=VALUE"),
        }
    }
    Ok(())
}

fn mark_running(service: &mut ServiceDescription) {
    service
        .metadata
        .insert(META_STATUS.to_string(), STATUS_RUNNING.to_string());
    service
        .metadata
        .insert(META_BUILD.to_string(), chrono::Utc::now().to_rfc3339());
}

/// Terminate an owned child and drop its record if it still points at it.
fn release(services_dir: &Path, name: &str, child: &mut Child) -> anyhow::Result<()> {
    let pid = child.id();
    terminate_child(child).with_context(|| format!("Failed to stop service {name}"))?;
    remove_record_of(services_dir, name, Some(pid))
}

fn terminate_child(child: &mut Child) -> anyhow::Result<()> {
    if child.try_wait()?.is_none() {
        child.kill().context("Failed to kill service process")?;
    }
    child.wait().context("Failed to wait for service process")?;
    Ok(())
}

#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    // EPERM means the process exists but belongs to someone else
    matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    true
}

#[cfg(unix)]
fn terminate_pid(pid: u32) -> anyhow::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).with_context(|| format!("invalid process id {pid}"))?;
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => {
            tracing::debug!(pid, "process not running");
            Ok(())
        }
        Err(Errno::EPERM) => anyhow::bail!("not permitted to stop process {pid}"),
        Err(e) => Err(e).with_context(|| format!("Failed to signal process {pid}")),
    }
}

#[cfg(not(unix))]
fn terminate_pid(pid: u32) -> anyhow::Result<()> {
    anyhow::bail!("cannot stop process {pid} owned by another invocation on this platform")
}

fn record_path(services_dir: &Path, name: &str) -> PathBuf {
    services_dir.join(format!("{name}.json"))
}

fn write_record(services_dir: &Path, record: &ServiceRecord) -> anyhow::Result<()> {
    let path = record_path(services_dir, &record.service.name);
    let staging = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(record)?;
    let written = std::fs::write(&staging, content).and_then(|()| std::fs::rename(&staging, &path));
    if written.is_err() && staging.exists() {
        std::fs::remove_file(&staging).ok();
    }
    written.with_context(|| format!("Failed to write service record: {}", path.display()))
}

/// Remove the record for `name` when it carries `pid`.
fn remove_record_of(services_dir: &Path, name: &str, pid: Option<u32>) -> anyhow::Result<()> {
    match read_record(services_dir, name)? {
        Some(record) if record.pid == pid => {}
        Some(record) => {
            tracing::debug!(service = %name, pid = ?record.pid, "record owned by another process");
            return Ok(());
        }
        None => return Ok(()),
    }

    let path = record_path(services_dir, name);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e)
            .with_context(|| format!("Failed to remove service record: {}", path.display())),
    }
}

fn read_record(services_dir: &Path, name: &str) -> anyhow::Result<Option<ServiceRecord>> {
    parse_record(&record_path(services_dir, name))
}

fn parse_record(path: &Path) -> anyhow::Result<Option<ServiceRecord>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read service record: {}", path.display()))?;
    match serde_json::from_str::<ServiceRecord>(&content) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::warn!(path = %path.display(), "skipping unreadable service record: {e}");
            Ok(None)
        }
    }
}

fn load_records(services_dir: &Path) -> anyhow::Result<Vec<ServiceRecord>> {
    if !services_dir.exists() {
        return Ok(Vec::new());
    }
    let mut records = Vec::new();
    for entry in std::fs::read_dir(services_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        records.extend(parse_record(&path)?);
    }
    Ok(records)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::backend::notifier::PollingNotifier;
    use crate::types::ExecutionEnvironment;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn sleep_options() -> CreateOptions {
        CreateOptions {
            command: ExecCommand::new(vec!["sleep".to_string(), "30".to_string()]),
            env: ExecutionEnvironment::from(vec!["HOIST_TEST=1".to_string()]),
        }
    }

    fn started_runtime(temp: &TempDir) -> LocalRuntime {
        let mut runtime = LocalRuntime::new(temp.path().to_path_buf());
        runtime.start().unwrap();
        runtime
    }

    #[test]
    fn test_create_requires_start() {
        let temp = TempDir::new().unwrap();
        let runtime = LocalRuntime::new(temp.path().to_path_buf());

        let err = runtime
            .create(&ServiceDescription::new("demo"), &sleep_options())
            .unwrap_err();
        assert!(err.to_string().contains("not started"));
    }

    #[test]
    fn test_create_list_delete() {
        let temp = TempDir::new().unwrap();
        let mut runtime = started_runtime(&temp);
        let service = ServiceDescription::new("demo").with_version("v1");

        runtime.create(&service, &sleep_options()).unwrap();

        let listed = runtime.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "demo");
        assert_eq!(listed[0].meta(META_STATUS), STATUS_RUNNING);
        assert!(!listed[0].meta(META_BUILD).is_empty());
        assert!(runtime.services_dir().join("demo.json").exists());

        runtime.delete(&ServiceDescription::new("demo")).unwrap();
        assert!(runtime.list().unwrap().is_empty());

        runtime.stop().unwrap();
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let temp = TempDir::new().unwrap();
        let mut runtime = started_runtime(&temp);
        let service = ServiceDescription::new("demo");

        runtime.create(&service, &sleep_options()).unwrap();
        let err = runtime.create(&service, &sleep_options()).unwrap_err();
        assert!(err.to_string().contains("already running"));

        runtime.stop().unwrap();
    }

    #[test]
    fn test_malformed_env_rejected() {
        let temp = TempDir::new().unwrap();
        let runtime = started_runtime(&temp);
        let mut options = sleep_options();
        options.env.push("not-a-pair");

        let err = runtime
            .create(&ServiceDescription::new("demo"), &options)
            .unwrap_err();
        assert!(err.to_string().contains("not-a-pair"));
        assert!(runtime.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_unknown_fails() {
        let temp = TempDir::new().unwrap();
        let runtime = started_runtime(&temp);

        let err = runtime.delete(&ServiceDescription::new("ghost")).unwrap_err();
        assert_eq!(err.to_string(), "service ghost not found");
    }

    #[test]
    fn test_delete_version_mismatch_fails() {
        let temp = TempDir::new().unwrap();
        let mut runtime = started_runtime(&temp);
        runtime
            .create(
                &ServiceDescription::new("demo").with_version("v1"),
                &sleep_options(),
            )
            .unwrap();

        let err = runtime
            .delete(&ServiceDescription::new("demo").with_version("v2"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));

        runtime.stop().unwrap();
    }

    #[test]
    fn test_stop_terminates_owned_children() {
        let temp = TempDir::new().unwrap();
        let mut runtime = started_runtime(&temp);
        runtime
            .create(&ServiceDescription::new("demo"), &sleep_options())
            .unwrap();

        runtime.stop().unwrap();

        assert!(!runtime.services_dir().join("demo.json").exists());
    }

    #[test]
    fn test_metadata_round_trips_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let runtime = started_runtime(&temp);
        let mut service = ServiceDescription::new("tagged");
        service
            .metadata
            .insert("team".to_string(), "payments".to_string());
        let record = ServiceRecord {
            service,
            pid: None,
            command: ExecCommand::default(),
            env: Vec::new(),
        };
        write_record(runtime.services_dir(), &record).unwrap();

        let listed = runtime.read(&ReadQuery::new().with_service("tagged")).unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].meta("team"), "payments");
    }

    fn recorded_pid(runtime: &LocalRuntime, name: &str) -> Option<u32> {
        read_record(runtime.services_dir(), name)
            .unwrap()
            .and_then(|record| record.pid)
    }

    fn exited_pid() -> u32 {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        pid
    }

    #[test]
    fn test_second_runtime_cannot_create_live_name() {
        let temp = TempDir::new().unwrap();
        let mut first = started_runtime(&temp);
        let mut second = started_runtime(&temp);
        let service = ServiceDescription::new("demo");

        first.create(&service, &sleep_options()).unwrap();
        let owner = recorded_pid(&first, "demo");

        let err = second.create(&service, &sleep_options()).unwrap_err();
        assert!(err.to_string().contains("already running"));
        assert_eq!(recorded_pid(&second, "demo"), owner);
        assert_eq!(second.list().unwrap().len(), 1);

        first.stop().unwrap();
        second.stop().unwrap();
    }

    #[test]
    fn test_stop_keeps_record_of_other_owner() {
        let temp = TempDir::new().unwrap();
        let mut runtime = started_runtime(&temp);
        runtime
            .create(&ServiceDescription::new("demo"), &sleep_options())
            .unwrap();

        let mut other = Command::new("sleep").arg("30").spawn().unwrap();
        let record = ServiceRecord {
            service: ServiceDescription::new("demo"),
            pid: Some(other.id()),
            command: ExecCommand::new(vec!["sleep".to_string(), "30".to_string()]),
            env: Vec::new(),
        };
        write_record(runtime.services_dir(), &record).unwrap();

        runtime.stop().unwrap();

        assert_eq!(recorded_pid(&runtime, "demo"), Some(other.id()));
        other.kill().unwrap();
        other.wait().unwrap();
    }

    #[test]
    fn test_failed_record_write_stops_child() {
        let temp = TempDir::new().unwrap();
        let runtime = started_runtime(&temp);
        let marker = temp.path().join("child.pid");
        std::fs::create_dir_all(runtime.services_dir().join("demo.json")).unwrap();
        let options = CreateOptions {
            command: ExecCommand::new(vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("echo $$ > {}; exec sleep 30", marker.display()),
            ]),
            env: ExecutionEnvironment::default(),
        };

        let err = runtime
            .create(&ServiceDescription::new("demo"), &options)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write service record"));
        assert!(runtime.lock().unwrap().children.is_empty());

        // a surviving child would have written its pid by now
        std::thread::sleep(Duration::from_millis(300));
        if let Ok(content) = std::fs::read_to_string(&marker)
            && let Ok(pid) = content.trim().parse::<u32>()
        {
            assert!(!pid_alive(pid));
        }
    }

    #[test]
    fn test_path_like_names_rejected() {
        let temp = TempDir::new().unwrap();
        let runtime = started_runtime(&temp);

        for name in ["../../escaped", "team/api", "..", ".", "", "a\\b"] {
            let err = runtime
                .create(&ServiceDescription::new(name), &sleep_options())
                .unwrap_err();
            assert!(err.to_string().contains("invalid service name"), "{name}");
        }
        let err = runtime
            .delete(&ServiceDescription::new("../escaped"))
            .unwrap_err();
        assert!(err.to_string().contains("invalid service name"));

        assert!(!temp.path().join("escaped.json").exists());
        assert!(runtime.list().unwrap().is_empty());
    }

    #[test]
    fn test_stale_record_reported_stopped_and_removed() {
        let temp = TempDir::new().unwrap();
        let runtime = started_runtime(&temp);
        let mut service = ServiceDescription::new("stale");
        mark_running(&mut service);
        let record = ServiceRecord {
            service,
            pid: Some(exited_pid()),
            command: ExecCommand::default(),
            env: Vec::new(),
        };
        write_record(runtime.services_dir(), &record).unwrap();

        let listed = runtime.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].meta(META_STATUS), STATUS_STOPPED);

        runtime.delete(&ServiceDescription::new("stale")).unwrap();
        assert!(runtime.list().unwrap().is_empty());
    }

    #[test]
    fn test_stale_record_does_not_block_create() {
        let temp = TempDir::new().unwrap();
        let mut runtime = started_runtime(&temp);
        let record = ServiceRecord {
            service: ServiceDescription::new("demo"),
            pid: Some(exited_pid()),
            command: ExecCommand::default(),
            env: Vec::new(),
        };
        write_record(runtime.services_dir(), &record).unwrap();

        runtime
            .create(&ServiceDescription::new("demo"), &sleep_options())
            .unwrap();
        assert_ne!(recorded_pid(&runtime, "demo"), record.pid);

        runtime.stop().unwrap();
        assert!(recorded_pid(&runtime, "demo").is_none());
    }

    #[test]
    fn test_pid_probe() {
        let pid = exited_pid();
        assert!(!pid_alive(pid));
        terminate_pid(pid).unwrap();

        // init always exists, whether or not it may be signalled
        assert!(pid_alive(1));
    }

    #[test]
    fn test_stop_releases_remaining_children_after_failure() {
        use nix::sys::signal::{Signal, kill};
        use nix::sys::wait::waitpid;
        use nix::unistd::Pid;

        let temp = TempDir::new().unwrap();
        let mut runtime = started_runtime(&temp);
        runtime
            .create(&ServiceDescription::new("broken"), &sleep_options())
            .unwrap();
        runtime
            .create(&ServiceDescription::new("healthy"), &sleep_options())
            .unwrap();

        // reap "broken" behind the runtime's back so waiting on it fails
        let broken = Pid::from_raw(recorded_pid(&runtime, "broken").unwrap() as i32);
        kill(broken, Signal::SIGKILL).unwrap();
        waitpid(broken, None).unwrap();
        let healthy = recorded_pid(&runtime, "healthy").unwrap();

        let err = runtime.stop().unwrap_err();

        assert!(err.to_string().contains("broken"));
        assert!(!pid_alive(healthy));
        assert!(recorded_pid(&runtime, "healthy").is_none());
        let err = runtime
            .create(&ServiceDescription::new("late"), &sleep_options())
            .unwrap_err();
        assert!(err.to_string().contains("not started"));
    }

    #[test]
    fn test_source_change_restarts_service() {
        let state = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("main.go"), "package main").unwrap();
        let notifier = PollingNotifier::new(
            "demo".to_string(),
            String::new(),
            source.path().to_path_buf(),
            Duration::from_millis(20),
        );
        let mut runtime = LocalRuntime::new(state.path().to_path_buf())
            .with_notifier(Box::new(notifier))
            .unwrap();
        runtime.start().unwrap();
        runtime
            .create(&ServiceDescription::new("demo"), &sleep_options())
            .unwrap();
        let first = recorded_pid(&runtime, "demo").unwrap();

        std::fs::write(source.path().join("handler.go"), "package main").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut restarted = None;
        while Instant::now() < deadline {
            if let Some(pid) = recorded_pid(&runtime, "demo")
                && pid != first
            {
                restarted = Some(pid);
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        let restarted = restarted.expect("service was not restarted");
        assert!(!pid_alive(first));

        runtime.stop().unwrap();
        assert!(!pid_alive(restarted));
    }
}
