// src/engine/core.rs

//! Pure supervisor state machine.
//!
//! Consumes [`SupervisorEvent`]s and produces:
//! - an updated phase
//! - a list of commands describing what the IO shell should do next
//!
//! No channels, no Tokio, no processes: the core is unit tested on its own.

use crate::engine::{RuntimeOptions, StartupPlan, SupervisorEvent};
use crate::exec::CompletedTask;
use crate::signals::HardwareSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Connections are being established.
    Connecting,
    /// Every connection completed; startup operations were issued.
    Ready,
    ShuttingDown,
}

/// Command produced by the core, executed by the shell.
#[derive(Debug, Clone)]
pub enum SupervisorCommand {
    /// Issue the post-connection operations.
    RunStartup(StartupPlan),
    /// Hand a task's output to the routing table.
    RouteCompletion(CompletedTask),
    ForwardSignal(HardwareSignal),
    DisconnectAll,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct SupervisorStep {
    pub commands: Vec<SupervisorCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl SupervisorStep {
    fn run(commands: Vec<SupervisorCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug)]
pub struct SupervisorCore {
    phase: Phase,
    startup: StartupPlan,
    options: RuntimeOptions,
}

impl SupervisorCore {
    pub fn new(startup: StartupPlan, options: RuntimeOptions) -> Self {
        Self {
            phase: Phase::Connecting,
            startup,
            options,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> RuntimeOptions {
        self.options
    }

    /// Whether a one-shot run may stop once no task is in flight.
    pub fn idle_exit_allowed(&self) -> bool {
        self.options.exit_when_idle && self.phase == Phase::Ready
    }

    pub fn step(&mut self, event: SupervisorEvent) -> SupervisorStep {
        match event {
            SupervisorEvent::AllConnectionsComplete => match self.phase {
                Phase::Connecting => {
                    self.phase = Phase::Ready;
                    SupervisorStep::run(vec![SupervisorCommand::RunStartup(self.startup)])
                }
                // A later sequence (reconnect of everything) does not rerun
                // the startup operations.
                Phase::Ready | Phase::ShuttingDown => SupervisorStep::run(Vec::new()),
            },
            SupervisorEvent::TaskCompleted(task) => {
                SupervisorStep::run(vec![SupervisorCommand::RouteCompletion(task)])
            }
            SupervisorEvent::Signal(signal) => match self.phase {
                Phase::ShuttingDown => SupervisorStep::run(Vec::new()),
                _ => SupervisorStep::run(vec![SupervisorCommand::ForwardSignal(signal)]),
            },
            SupervisorEvent::ShutdownRequested => {
                let commands = if self.phase == Phase::ShuttingDown {
                    Vec::new()
                } else {
                    vec![SupervisorCommand::DisconnectAll]
                };
                self.phase = Phase::ShuttingDown;
                SupervisorStep {
                    commands,
                    keep_running: false,
                }
            }
        }
    }
}
