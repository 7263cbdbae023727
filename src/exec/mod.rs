// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the machine's commands and
//! scripts, using `tokio::process::Command`, and reporting each result back to
//! a [`TaskOwner`] exactly once.
//!
//! - [`invocation`] describes what to run (command, script or shell line).
//! - [`output`] reads process output line by line, lossily.
//! - [`task`] runs one process: drain stdout, wait with a soft timeout,
//!   report.
//! - [`launcher`] spawns tasks onto Tokio and tracks how many are in flight.

pub mod invocation;
pub mod launcher;
pub mod output;
pub mod task;

pub use invocation::Invocation;
pub use launcher::TaskLauncher;
pub use output::OutputLines;
pub use task::{CompletedTask, ProcessTask, TaskOutcome, TaskOwner};
