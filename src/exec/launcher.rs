// src/exec/launcher.rs

//! Spawns [`ProcessTask`]s onto their own Tokio tasks.
//!
//! The launcher is cheap to clone and is handed to every component that needs
//! to start processes (the dispatcher, endpoint implementations). It also
//! counts tasks that were launched but whose completion has not been routed
//! yet, which the supervisor uses to decide when a one-shot run is done.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::exec::invocation::Invocation;
use crate::exec::task::{ProcessTask, TaskOwner};
use crate::types::{ProcessSupport, TaskKind};

#[derive(Clone)]
pub struct TaskLauncher {
    scripts_dir: PathBuf,
    process_support: ProcessSupport,
    owner: Arc<dyn TaskOwner>,
    in_flight: Arc<AtomicUsize>,
}

impl fmt::Debug for TaskLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskLauncher")
            .field("scripts_dir", &self.scripts_dir)
            .field("process_support", &self.process_support)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl TaskLauncher {
    pub fn new(
        scripts_dir: impl Into<PathBuf>,
        process_support: ProcessSupport,
        owner: Arc<dyn TaskOwner>,
    ) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            process_support,
            owner,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn process_support(&self) -> ProcessSupport {
        self.process_support
    }

    /// A script task from the scripts directory, not yet launched.
    pub fn script_task(
        &self,
        kind: TaskKind,
        name: &str,
        args: Vec<String>,
        timeout: Duration,
    ) -> ProcessTask {
        ProcessTask::new(kind, Invocation::script(name, args), timeout)
            .with_working_dir(&self.scripts_dir)
    }

    /// A command task (no working directory), not yet launched.
    pub fn command_task(&self, kind: TaskKind, line: &str, timeout: Duration) -> ProcessTask {
        ProcessTask::new(kind, Invocation::command(line), timeout)
    }

    /// Run `task` on its own Tokio task; its completion goes to the owner.
    pub fn launch(&self, task: ProcessTask) -> JoinHandle<()> {
        let task = task.with_process_support(self.process_support.is_available());
        let owner = Arc::clone(&self.owner);

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(task = %task.kind(), in_flight, "launching task");

        tokio::spawn(async move {
            task.run(owner.as_ref()).await;
        })
    }

    /// Called once a completion has been handled by the router.
    pub fn task_routed(&self) {
        // Saturate instead of wrapping if a foreign completion slips in.
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Launched tasks whose completion has not been routed yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}
