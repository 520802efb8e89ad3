//! Signal-driven teardown for local runs.
//!
//! After a successful create the coordinator waits for one termination
//! signal, deletes the service and stops the backend:
//!
//! ```text
//! Running -> AwaitingSignal -> Deleting -> Stopping -> Terminated
//! ```
//!
//! A failed delete halts in `Deleting`; the backend is not stopped while it
//! may still reference a live service.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use crate::backend::RuntimeBackend;
use crate::error::{Error, Result};
use crate::types::ServiceDescription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    AwaitingSignal,
    Deleting,
    Stopping,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Quit,
}

/// Blocking source of termination signals.
pub trait SignalSource {
    /// Block until one signal arrives and consume it.
    fn wait(&mut self) -> anyhow::Result<Signal>;
}

/// Process signals (SIGINT, SIGTERM, SIGQUIT; ctrl-c on Windows).
///
/// Handlers are registered on construction, so a signal that arrives before
/// [`SignalSource::wait`] is kept until the wait begins.
pub struct OsSignals {
    runtime: tokio::runtime::Runtime,
    listeners: Listeners,
}

impl OsSignals {
    pub fn register() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
        let listeners = {
            let _guard = runtime.enter();
            Listeners::register()?
        };
        Ok(Self { runtime, listeners })
    }
}

impl SignalSource for OsSignals {
    fn wait(&mut self) -> anyhow::Result<Signal> {
        let listeners = &mut self.listeners;
        self.runtime
            .block_on(listeners.recv())
            .ok_or_else(|| anyhow::anyhow!("signal listeners closed"))
    }
}

#[cfg(unix)]
struct Listeners {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Listeners {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some(Signal::Interrupt),
            Some(()) = self.terminate.recv() => Some(Signal::Terminate),
            Some(()) = self.quit.recv() => Some(Signal::Quit),
            else => None,
        }
    }
}

#[cfg(windows)]
struct Listeners {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl Listeners {
    fn register() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) -> Option<Signal> {
        self.ctrl_c.recv().await.map(|()| Signal::Interrupt)
    }
}

/// Single-slot in-process signal channel.
pub fn signal_channel() -> (SignalSender, ChannelSignals) {
    let (tx, rx) = mpsc::sync_channel(1);
    (SignalSender(tx), ChannelSignals(rx))
}

#[derive(Debug, Clone)]
pub struct SignalSender(SyncSender<Signal>);

impl SignalSender {
    /// Queue a signal. Returns `false` when one is already pending or the
    /// receiver is gone.
    pub fn send(&self, signal: Signal) -> bool {
        match self.0.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Debug)]
pub struct ChannelSignals(Receiver<Signal>);

impl SignalSource for ChannelSignals {
    fn wait(&mut self) -> anyhow::Result<Signal> {
        self.0
            .recv()
            .map_err(|_| anyhow::anyhow!("signal channel closed"))
    }
}

#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: ShutdownState,
    history: Vec<ShutdownState>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            state: ShutdownState::Running,
            history: vec![ShutdownState::Running],
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.state
    }

    /// Every state visited so far, in order.
    pub fn history(&self) -> &[ShutdownState] {
        &self.history
    }

    /// Wait for one signal, then delete `service` and stop `backend`.
    pub fn run(
        &mut self,
        backend: &mut dyn RuntimeBackend,
        service: &ServiceDescription,
        signals: &mut dyn SignalSource,
    ) -> Result<()> {
        self.transition(ShutdownState::AwaitingSignal);
        let signal = signals.wait().map_err(Error::Signal)?;
        tracing::info!(?signal, service = %service.name, "shutting down");

        self.transition(ShutdownState::Deleting);
        backend.delete(service).map_err(Error::BackendOperation)?;

        self.transition(ShutdownState::Stopping);
        backend.stop().map_err(Error::BackendOperation)?;

        self.transition(ShutdownState::Terminated);
        Ok(())
    }

    fn transition(&mut self, next: ShutdownState) {
        tracing::debug!(from = ?self.state, to = ?next, "shutdown transition");
        self.state = next;
        self.history.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_buffers_one_pending_signal() {
        let (tx, mut rx) = signal_channel();

        assert!(tx.send(Signal::Interrupt));
        assert!(!tx.send(Signal::Terminate));

        assert_eq!(rx.wait().unwrap(), Signal::Interrupt);
    }

    #[test]
    fn test_channel_wait_fails_when_sender_dropped() {
        let (tx, mut rx) = signal_channel();
        drop(tx);
        assert!(rx.wait().is_err());
    }

    #[test]
    fn test_new_coordinator_is_running() {
        let coordinator = ShutdownCoordinator::new();
        assert_eq!(coordinator.state(), ShutdownState::Running);
        assert_eq!(coordinator.history(), &[ShutdownState::Running]);
    }
}
