// src/lib.rs

pub mod cli;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod signals;
pub mod timer;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::config::Settings;
use crate::connection::ConnectionManager;
use crate::dispatch::{CompletionRouter, DeviceDiscovery, DispatchContext, TaskDispatcher};
use crate::domain::{
    DeviceLink, NetworkLink, NotificationLog, TracingAudit, UnmonitoredDevices, UpdateState,
};
use crate::engine::{
    EventSink, RuntimeOptions, StartupPlan, Supervisor, SupervisorCore, event_channel,
};
use crate::exec::TaskLauncher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - launcher / dispatcher / router
/// - network and device endpoints in the connection manager
/// - the supervisor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;
    apply_overrides(&mut cfg, &args);

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let options = RuntimeOptions {
        exit_when_idle: args.once,
        ..RuntimeOptions::default()
    };
    let (supervisor, sink) = build_supervisor(&cfg, options)?;

    // Ctrl-C → graceful shutdown.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        sink.request_shutdown();
    });

    supervisor.run().await?;
    Ok(())
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let Some(dir) = &args.scripts_dir {
        debug!(dir = %dir.display(), "scripts_dir overridden on the command line");
        cfg.system.scripts_dir = dir.clone();
    }
    if let Some(support) = args.process_support {
        debug!(?support, "process_support overridden on the command line");
        cfg.system.process_support = support;
    }
}

/// Build a ready-to-run [`Supervisor`] from a validated config.
///
/// The returned [`EventSink`] feeds the supervisor: hardware signals and
/// shutdown requests go through it.
pub fn build_supervisor(cfg: &ConfigFile, options: RuntimeOptions) -> Result<(Supervisor, EventSink)> {
    let (sink, events) = event_channel();

    let settings: Arc<dyn Settings> = Arc::new(cfg.settings());
    let updates = Arc::new(UpdateState::new(cfg.update.beta));
    let launcher = TaskLauncher::new(
        cfg.system.scripts_dir.clone(),
        cfg.system.process_support,
        Arc::new(sink.clone()),
    );
    let dispatcher = TaskDispatcher::new(
        launcher,
        settings,
        updates.clone(),
        Arc::new(TracingAudit),
    );

    let mut connections = ConnectionManager::new(cfg.connections.match_by, Arc::new(sink.clone()));

    let network = Arc::new(NetworkLink::new(
        dispatcher.clone(),
        cfg.network.policy(),
        cfg.network.connected_status.clone(),
    ));
    if cfg.network.enabled {
        connections.add_connection(network.clone());
    }

    let devices: Arc<dyn DeviceDiscovery> = if cfg.devices.enabled {
        let pattern = Regex::new(&cfg.devices.pattern)
            .with_context(|| format!("compiling device pattern '{}'", cfg.devices.pattern))?;
        let link = Arc::new(DeviceLink::new(dispatcher.clone(), cfg.devices.policy(), pattern));
        connections.add_connection(link.clone());
        link
    } else {
        Arc::new(UnmonitoredDevices)
    };

    let router = CompletionRouter::new(DispatchContext {
        network,
        updates,
        notifications: Arc::new(NotificationLog::new()),
        devices,
    });

    let startup = StartupPlan {
        check_for_update: cfg.startup.check_for_update,
        start_vpn: cfg.startup.start_vpn,
    };
    info!(
        connections = connections.connections().len(),
        ?startup,
        once = options.exit_when_idle,
        "supervisor wired"
    );

    let core = SupervisorCore::new(startup, options);
    let supervisor = Supervisor::new(core, events, connections, dispatcher, router)
        .with_clear_terminal(cfg.startup.clear_terminal);

    Ok((supervisor, sink))
}

/// Simple dry-run output: print the connection plan and startup operations.
fn print_dry_run(cfg: &ConfigFile) {
    println!("spoolr dry-run");
    println!("  system.scripts_dir = {}", cfg.system.scripts_dir.display());
    println!("  system.process_support = {:?}", cfg.system.process_support);
    println!("  connections.match_by = {:?}", cfg.connections.match_by);
    println!();

    println!("connections (in order):");
    if cfg.network.enabled {
        println!("  - network");
        println!("      connected_status: {}", cfg.network.connected_status);
        print_policy(&cfg.network.policy());
    }
    if cfg.devices.enabled {
        println!("  - devices");
        println!("      pattern: {}", cfg.devices.pattern);
        print_policy(&cfg.devices.policy());
    }
    if !cfg.network.enabled && !cfg.devices.enabled {
        println!("  (none)");
    }
    println!();

    println!("startup:");
    println!("  clear_terminal: {}", cfg.startup.clear_terminal);
    println!("  start_vpn: {}", cfg.startup.start_vpn);
    println!("  check_for_update: {}", cfg.startup.check_for_update);
    println!(
        "  update branch: {}",
        if cfg.update.beta { "beta" } else { "master" }
    );

    debug!("dry-run complete (no execution)");
}

fn print_policy(policy: &connection::ConnectionPolicy) {
    println!("      attempt_timeout: {:?}", policy.attempt_timeout);
    match policy.reconnect_delay {
        Some(delay) => println!("      reconnect_delay: {delay:?}"),
        None => println!("      reconnect_delay: (no retry)"),
    }
    match policy.max_attempts {
        Some(max) => println!("      max_attempts: {max}"),
        None => println!("      max_attempts: unlimited"),
    }
}
