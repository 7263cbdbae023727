// src/dispatch/router.rs

use tracing::{debug, trace};

use crate::dispatch::handlers::DispatchContext;
use crate::dispatch::routes::route_for;
use crate::exec::CompletedTask;

/// Hands completed task output to the collaborator its kind belongs to.
#[derive(Debug, Clone)]
pub struct CompletionRouter {
    context: DispatchContext,
}

impl CompletionRouter {
    pub fn new(context: DispatchContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    /// Apply the routing table. Returns whether a route handled the task.
    pub fn route(&self, task: &CompletedTask) -> bool {
        match route_for(task.kind) {
            Some(route) => {
                debug!(
                    task = %task.kind,
                    route = route.name,
                    outcome = ?task.outcome,
                    "routing completion"
                );
                (route.handler)(&self.context, task);
                true
            }
            None => {
                trace!(task = %task.kind, "no route; dropping output");
                false
            }
        }
    }
}
