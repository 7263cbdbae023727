// src/engine/mod.rs

//! Supervisor for spoolr.
//!
//! This module ties together:
//! - the connection manager (sequenced establishment of endpoints)
//! - the task dispatcher and completion router
//! - hardware signal forwarding
//! - shutdown handling
//!
//! The pure phase machine lives in [`core`]; the async/IO shell that owns the
//! collaborators is implemented in [`runtime`]. Callbacks from running tasks
//! and from the connection manager arrive as [`SupervisorEvent`]s through an
//! [`EventSink`].

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::connection::ConnectionListener;
use crate::exec::{CompletedTask, TaskOwner};
use crate::signals::HardwareSignal;

pub mod core;
pub mod runtime;

pub use core::{Phase, SupervisorCommand, SupervisorCore, SupervisorStep};
pub use runtime::Supervisor;

/// Events flowing into the supervisor.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// The connection manager finished its sequence.
    AllConnectionsComplete,
    /// A process task reported its result.
    TaskCompleted(CompletedTask),
    /// An input pin changed.
    Signal(HardwareSignal),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Exit once every connection is complete and every launched task has
    /// been routed (used for `--once`).
    pub exit_when_idle: bool,
    /// How long shutdown waits for in-flight tasks (the disconnect scripts)
    /// before giving up on them.
    pub shutdown_grace: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            exit_when_idle: false,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Operations issued once the machine is connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupPlan {
    pub check_for_update: bool,
    pub start_vpn: bool,
}

/// Sending half of the supervisor's event channel.
///
/// Implements the narrow callback traits so tasks and connections never see
/// the supervisor itself.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SupervisorEvent>,
}

impl EventSink {
    pub fn send(&self, event: SupervisorEvent) {
        if self.tx.send(event).is_err() {
            debug!("supervisor gone; dropping event");
        }
    }

    pub fn signal(&self, signal: HardwareSignal) {
        self.send(SupervisorEvent::Signal(signal));
    }

    pub fn request_shutdown(&self) {
        self.send(SupervisorEvent::ShutdownRequested);
    }
}

impl TaskOwner for EventSink {
    fn task_completed(&self, task: CompletedTask) {
        self.send(SupervisorEvent::TaskCompleted(task));
    }
}

impl ConnectionListener for EventSink {
    fn all_connections_complete(&self) {
        self.send(SupervisorEvent::AllConnectionsComplete);
    }
}

pub fn event_channel() -> (EventSink, mpsc::UnboundedReceiver<SupervisorEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}
