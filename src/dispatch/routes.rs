// src/dispatch/routes.rs

//! Completion routing table.
//!
//! Routes are keyed by [`TaskKind`]; the first entry whose predicate accepts
//! the kind handles the output. Kinds without a route are dropped silently.

use tracing::debug;

use crate::dispatch::handlers::DispatchContext;
use crate::exec::CompletedTask;
use crate::types::TaskKind;

/// Status the network link reports while it is re-establishing itself. A
/// disconnect completing in that window must not overwrite it.
pub const RECONNECTING_STATUS: &str = "Reconnecting";

pub type Handler = fn(&DispatchContext, &CompletedTask);

pub struct Route {
    pub name: &'static str,
    pub matches: fn(TaskKind) -> bool,
    pub handler: Handler,
}

pub static ROUTES: &[Route] = &[
    Route {
        name: "usb-devices",
        matches: |kind| kind == TaskKind::UsbDevices,
        handler: devices_reported,
    },
    Route {
        name: "network-connect",
        matches: |kind| kind == TaskKind::NetworkConnect,
        handler: network_status,
    },
    Route {
        name: "update-check",
        matches: |kind| kind == TaskKind::UpdateCheck,
        handler: update_check,
    },
    Route {
        name: "network-disconnect",
        matches: |kind| kind == TaskKind::NetworkDisconnect,
        handler: network_disconnected,
    },
    Route {
        name: "email",
        matches: TaskKind::is_email,
        handler: email_status,
    },
];

/// The route for `kind`, if any.
pub fn route_for(kind: TaskKind) -> Option<&'static Route> {
    ROUTES.iter().find(|route| (route.matches)(kind))
}

fn devices_reported(ctx: &DispatchContext, task: &CompletedTask) {
    ctx.devices.devices_reported(&task.output);
}

fn network_status(ctx: &DispatchContext, task: &CompletedTask) {
    ctx.network.set_status_value(&task.output);
    ctx.network.check_if_connected();
}

fn update_check(ctx: &DispatchContext, task: &CompletedTask) {
    ctx.updates
        .set_update_available(task.output.contains("true"));
}

fn network_disconnected(ctx: &DispatchContext, task: &CompletedTask) {
    if ctx.network.has_status_value(RECONNECTING_STATUS) {
        debug!("disconnect finished while reconnecting; keeping status");
        return;
    }
    network_status(ctx, task);
}

fn email_status(ctx: &DispatchContext, task: &CompletedTask) {
    debug!(task = %task.kind, output = %task.output.trim_end(), "email script finished");
    ctx.notifications.set_status(&task.output);
}
