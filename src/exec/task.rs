// src/exec/task.rs

//! One supervised external process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, ChildStdout};
use tracing::{debug, error, info, warn};

use crate::errors::SpoolrError;
use crate::exec::invocation::Invocation;
use crate::exec::output::OutputLines;
use crate::types::TaskKind;

type StdoutLines = OutputLines<ChildStdout>;

/// How a [`ProcessTask`] ended.
///
/// None of these is an error from the caller's point of view; handlers judge
/// success from the captured output alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The process exited; the exit code is informational only.
    Exited(Option<i32>),
    /// The soft deadline passed. The process was left running, so its effect
    /// may still happen after this completion was reported.
    TimedOut,
    /// The process could not be started; output is empty.
    SpawnFailed,
    /// Waiting for the exit status failed after the output was drained.
    WaitFailed,
    /// This host does not run external processes; nothing was spawned.
    Unsupported,
}

/// The single hand-off from a finished task to its owner.
#[derive(Debug, Clone)]
pub struct CompletedTask {
    pub kind: TaskKind,
    /// Invocation text, as safe to log.
    pub invocation: String,
    /// Every stdout line read, each followed by `\n`. Invalid UTF-8 is
    /// replaced with U+FFFD.
    pub output: String,
    pub outcome: TaskOutcome,
    pub elapsed: Duration,
}

/// Receives task completions.
pub trait TaskOwner: Send + Sync {
    fn task_completed(&self, task: CompletedTask);
}

/// One external process invocation with a bounded wait and captured stdout.
#[derive(Debug, Clone)]
pub struct ProcessTask {
    kind: TaskKind,
    invocation: Invocation,
    timeout: Duration,
    working_dir: Option<PathBuf>,
    process_support: bool,
    secret_args: bool,
}

impl ProcessTask {
    /// `timeout` of `Duration::ZERO` waits for the process indefinitely.
    pub fn new(kind: TaskKind, invocation: Invocation, timeout: Duration) -> Self {
        Self {
            kind,
            invocation,
            timeout,
            working_dir: None,
            process_support: true,
            secret_args: false,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// When `false`, [`run`](Self::run) spawns nothing and completes at once
    /// with empty output.
    pub fn with_process_support(mut self, available: bool) -> Self {
        self.process_support = available;
        self
    }

    /// Keep the arguments (credentials, addresses) out of logs and out of
    /// [`CompletedTask::invocation`].
    pub fn with_secret_args(mut self) -> Self {
        self.secret_args = true;
        self
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Loggable form of the invocation.
    pub fn label(&self) -> String {
        if self.secret_args {
            format!("{} <args redacted>", self.invocation.name())
        } else {
            self.invocation.to_string()
        }
    }

    /// Run the process and report to `owner` exactly once.
    ///
    /// Spawn and read failures are logged and swallowed. When the timeout
    /// expires the wait stops but the process is not killed: a detached worker
    /// keeps draining its output and logs its eventual exit, while the owner
    /// receives whatever output had accumulated.
    pub async fn run(self, owner: &dyn TaskOwner) {
        let started = Instant::now();
        let label = self.label();
        let mut output = String::new();

        let outcome = if self.process_support {
            self.execute(&label, &mut output).await
        } else {
            debug!(task = %self.kind, invocation = %label, "process support unavailable; skipping");
            TaskOutcome::Unsupported
        };

        let elapsed = started.elapsed();
        debug!(
            task = %self.kind,
            ?outcome,
            ?elapsed,
            output_bytes = output.len(),
            "task complete"
        );

        owner.task_completed(CompletedTask {
            kind: self.kind,
            invocation: label,
            output,
            outcome,
            elapsed,
        });
    }

    async fn execute(&self, label: &str, output: &mut String) -> TaskOutcome {
        info!(
            task = %self.kind,
            invocation = %label,
            timeout = ?self.timeout,
            "starting process"
        );

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = SpoolrError::SpawnFailure {
                    invocation: label.to_string(),
                    source,
                };
                error!(task = %self.kind, error = %err, "spawn failed");
                return TaskOutcome::SpawnFailed;
            }
        };

        if let Some(stderr) = child.stderr.take() {
            let task = self.kind;
            tokio::spawn(async move {
                OutputLines::new(stderr).discard(task, "stderr").await;
            });
        }

        let mut stdout = child.stdout.take().map(OutputLines::new);
        let supervised = drain_and_wait(&mut child, stdout.as_mut(), output, self.kind, label);

        if self.timeout.is_zero() {
            return supervised.await;
        }

        let bounded = tokio::time::timeout(self.timeout, supervised).await;
        match bounded {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                let err = SpoolrError::TimeoutExceeded {
                    invocation: label.to_string(),
                    timeout: self.timeout,
                };
                warn!(task = %self.kind, error = %err, "soft timeout reached");
                continue_in_background(child, stdout, self.kind, label.to_string());
                TaskOutcome::TimedOut
            }
        }
    }

    fn spawn(&self) -> std::io::Result<Child> {
        let mut cmd = self.invocation.to_command(self.working_dir.as_deref())?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        cmd.spawn()
    }
}

/// Read stdout to the end, then wait for the exit status.
async fn drain_and_wait(
    child: &mut Child,
    stdout: Option<&mut StdoutLines>,
    output: &mut String,
    task: TaskKind,
    label: &str,
) -> TaskOutcome {
    if let Some(lines) = stdout {
        if let Err(source) = lines.read_into(output, task).await {
            let err = SpoolrError::StreamReadFailure {
                invocation: label.to_string(),
                source,
            };
            warn!(%task, error = %err, "kept partial output");
        }
    }

    match child.wait().await {
        Ok(status) => {
            info!(%task, exit_code = ?status.code(), "process exited");
            TaskOutcome::Exited(status.code())
        }
        Err(e) => {
            warn!(%task, error = %e, "waiting for process failed");
            TaskOutcome::WaitFailed
        }
    }
}

/// Keep a timed-out process company until it exits.
///
/// Draining stdout stops the process from blocking on a full pipe (or dying
/// of SIGPIPE); its late output only goes to the debug log.
fn continue_in_background(
    mut child: Child,
    stdout: Option<StdoutLines>,
    task: TaskKind,
    label: String,
) {
    tokio::spawn(async move {
        if let Some(mut lines) = stdout {
            lines.discard(task, "late stdout").await;
        }

        match child.wait().await {
            Ok(status) => info!(
                %task,
                invocation = %label,
                exit_code = ?status.code(),
                "process exited after its soft timeout; result was not reported"
            ),
            Err(e) => debug!(%task, error = %e, "lost track of timed-out process"),
        }
    });
}
