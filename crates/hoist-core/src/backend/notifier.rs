//! Source change notification for the local backend.
//!
//! `PollingNotifier` snapshots modification times under a directory and
//! rescans it on a fixed interval. Any added, removed or modified file yields
//! one [`NotifierEvent`] for the bound service.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, SystemTime};

use anyhow::Context;

/// Directories skipped while scanning.
const IGNORED_DIRS: &[&str] = &["target", "node_modules", "vendor"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierEvent {
    pub service: String,
    pub version: String,
    pub path: PathBuf,
}

/// Change source attached to a local backend.
pub trait Notifier: Send {
    /// Prepare the notifier. Called once when attached to a backend.
    fn init(&mut self) -> anyhow::Result<()>;

    /// Begin watching. Events stop once `stop` is set.
    fn watch(self: Box<Self>, stop: Arc<AtomicBool>) -> anyhow::Result<Receiver<NotifierEvent>>;
}

type Snapshot = BTreeMap<PathBuf, SystemTime>;

#[derive(Debug)]
pub struct PollingNotifier {
    name: String,
    version: String,
    dir: PathBuf,
    interval: Duration,
    snapshot: Option<Snapshot>,
}

impl PollingNotifier {
    pub fn new(name: String, version: String, dir: PathBuf, interval: Duration) -> Self {
        Self {
            name,
            version,
            dir,
            interval,
            snapshot: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Notifier for PollingNotifier {
    fn init(&mut self) -> anyhow::Result<()> {
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "not a local directory, nothing to watch");
            return Ok(());
        }
        self.snapshot = Some(scan(&self.dir)?);
        Ok(())
    }

    fn watch(self: Box<Self>, stop: Arc<AtomicBool>) -> anyhow::Result<Receiver<NotifierEvent>> {
        let PollingNotifier {
            name,
            version,
            dir,
            interval,
            snapshot,
        } = *self;

        let (tx, rx) = mpsc::channel();
        let Some(mut previous) = snapshot else {
            // dropping tx closes the channel right away
            return Ok(rx);
        };

        std::thread::Builder::new()
            .name(format!("hoist-notifier-{name}"))
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(interval);
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let current = match scan(&dir) {
                        Ok(current) => current,
                        Err(e) => {
                            tracing::warn!(dir = %dir.display(), "source scan failed: {e:#}");
                            continue;
                        }
                    };
                    if let Some(path) = first_change(&previous, &current) {
                        tracing::debug!(service = %name, path = %path.display(), "source changed");
                        let event = NotifierEvent {
                            service: name.clone(),
                            version: version.clone(),
                            path,
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    previous = current;
                }
            })
            .context("Failed to spawn notifier thread")?;

        Ok(rx)
    }
}

fn scan(dir: &Path) -> anyhow::Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory: {}", current.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if !is_ignored(&path) {
                    pending.push(path);
                }
            } else if file_type.is_file() {
                let modified = entry.metadata()?.modified()?;
                snapshot.insert(path, modified);
            }
        }
    }

    Ok(snapshot)
}

fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('.') || IGNORED_DIRS.iter().any(|ignored| name == *ignored)
        })
        .unwrap_or(false)
}

fn first_change(previous: &Snapshot, current: &Snapshot) -> Option<PathBuf> {
    for (path, modified) in current {
        if previous.get(path) != Some(modified) {
            return Some(path.clone());
        }
    }
    previous
        .keys()
        .find(|path| !current.contains_key(*path))
        .cloned()
}
