// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::connection::ConnectionManager;
use crate::dispatch::{CompletionRouter, TaskDispatcher};
use crate::errors::Result;
use crate::signals::SignalRouter;

use super::core::SupervisorCore;
use super::{SupervisorCommand, SupervisorEvent};

/// Drives the supervisor core in response to [`SupervisorEvent`]s and
/// connection completions.
///
/// This is the IO shell around [`SupervisorCore`], which holds the phase
/// semantics. The shell owns the collaborators and executes commands.
pub struct Supervisor {
    core: SupervisorCore,
    events: mpsc::UnboundedReceiver<SupervisorEvent>,
    connections: ConnectionManager,
    dispatcher: TaskDispatcher,
    router: CompletionRouter,
    signals: Option<SignalRouter>,
    clear_terminal: bool,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        core: SupervisorCore,
        events: mpsc::UnboundedReceiver<SupervisorEvent>,
        connections: ConnectionManager,
        dispatcher: TaskDispatcher,
        router: CompletionRouter,
    ) -> Self {
        Self {
            core,
            events,
            connections,
            dispatcher,
            router,
            signals: None,
            clear_terminal: false,
        }
    }

    pub fn with_signals(mut self, signals: SignalRouter) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Clear the console before the first connection attempt.
    pub fn with_clear_terminal(mut self, clear: bool) -> Self {
        self.clear_terminal = clear;
        self
    }

    pub fn core(&self) -> &SupervisorCore {
        &self.core
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Main event loop.
    ///
    /// - Starts the connection sequence.
    /// - Feeds connection completions to the manager and supervisor events to
    ///   the core.
    /// - Executes the commands the core returns.
    pub async fn run(mut self) -> Result<()> {
        info!("spoolr supervisor started");

        if self.clear_terminal {
            self.dispatcher.clear_terminal();
        }
        self.connections.connect_all();

        loop {
            let event = tokio::select! {
                Some(id) = self.connections.next_completion() => {
                    self.connections.connection_complete(id);
                    continue;
                }
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => {
                        info!("supervisor event channel closed; exiting");
                        break;
                    }
                },
            };

            debug!(?event, "supervisor received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("core requested exit; stopping supervisor");
                self.drain_in_flight().await;
                break;
            }

            if self.core.idle_exit_allowed() && self.dispatcher.launcher().in_flight() == 0 {
                info!("connected and idle; exiting (--once)");
                break;
            }
        }

        info!("supervisor exiting");
        Ok(())
    }

    fn execute_command(&mut self, command: SupervisorCommand) {
        match command {
            SupervisorCommand::RunStartup(plan) => {
                info!(?plan, "connections complete; running startup operations");
                if plan.start_vpn {
                    self.dispatcher.start_vpn();
                }
                if plan.check_for_update {
                    self.dispatcher.check_for_update();
                }
            }
            SupervisorCommand::RouteCompletion(task) => {
                self.router.route(&task);
                self.dispatcher.launcher().task_routed();
            }
            SupervisorCommand::ForwardSignal(signal) => match &self.signals {
                Some(router) => router.forward(signal),
                None => debug!(?signal, "no signal router; dropping signal"),
            },
            SupervisorCommand::DisconnectAll => self.connections.disconnect_all(),
        }
    }

    /// Give tasks started during shutdown a bounded chance to finish, routing
    /// whatever completes.
    async fn drain_in_flight(&mut self) {
        let grace = self.core.options().shutdown_grace;
        let deadline = Instant::now() + grace;

        while self.dispatcher.launcher().in_flight() > 0 {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(SupervisorEvent::TaskCompleted(task))) => {
                    self.execute_command(SupervisorCommand::RouteCompletion(task));
                }
                Ok(Some(other)) => debug!(event = ?other, "ignoring event during shutdown"),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        in_flight = self.dispatcher.launcher().in_flight(),
                        ?grace,
                        "tasks still running at shutdown"
                    );
                    break;
                }
            }
        }
    }
}
