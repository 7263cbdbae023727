// src/dispatch/dispatcher.rs

//! The machine's named privileged operations.
//!
//! Every operation builds one [`ProcessTask`] and launches it; the result comes
//! back later through the launcher's owner and is handed to the
//! [`CompletionRouter`](crate::dispatch::CompletionRouter). Operations never
//! block and never fail: a script that cannot be started completes with empty
//! output like any other.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Settings;
use crate::dispatch::handlers::{AuditLog, UpdateChannel};
use crate::exec::{ProcessTask, TaskLauncher};
use crate::types::TaskKind;

const UNBOUNDED: Duration = Duration::ZERO;
const DEVICES_TIMEOUT: Duration = Duration::from_secs(5);
const NETWORK_TOOL_TIMEOUT: Duration = Duration::from_secs(30);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(30);
const EMAIL_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(180);

pub const APN_KEY: &str = "network.apn";
pub const USERNAME_KEY: &str = "network.username";
pub const PASSWORD_KEY: &str = "network.password";

/// Fields every notification email starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailHeader {
    pub recipient: String,
    pub machine: String,
    pub datetime: String,
}

impl EmailHeader {
    fn into_args(self) -> Vec<String> {
        vec![self.recipient, self.machine, self.datetime]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleNotice {
    pub amount: String,
    pub method: String,
    pub remaining: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemNotice {
    pub code: String,
    pub description: String,
}

#[derive(Clone)]
pub struct TaskDispatcher {
    launcher: TaskLauncher,
    settings: Arc<dyn Settings>,
    channel: Arc<dyn UpdateChannel>,
    audit: Arc<dyn AuditLog>,
}

impl fmt::Debug for TaskDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDispatcher")
            .field("launcher", &self.launcher)
            .finish_non_exhaustive()
    }
}

impl TaskDispatcher {
    pub fn new(
        launcher: TaskLauncher,
        settings: Arc<dyn Settings>,
        channel: Arc<dyn UpdateChannel>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            launcher,
            settings,
            channel,
            audit,
        }
    }

    pub fn launcher(&self) -> &TaskLauncher {
        &self.launcher
    }

    pub fn clear_terminal(&self) -> JoinHandle<()> {
        self.launcher
            .launch(self.launcher.command_task(TaskKind::ClearTerminal, "clear", UNBOUNDED))
    }

    pub fn shut_down(&self) -> JoinHandle<()> {
        self.audit.write_log("Machine shut down.");
        self.script(TaskKind::Shutdown, "shutdown.sh", Vec::new(), UNBOUNDED)
    }

    pub fn restart(&self) -> JoinHandle<()> {
        self.audit.write_log("Machine restarting.");
        self.script(TaskKind::Restart, "restart.sh", Vec::new(), UNBOUNDED)
    }

    pub fn reset(&self) -> JoinHandle<()> {
        self.script(TaskKind::Reset, "reset.sh", Vec::new(), UNBOUNDED)
    }

    pub fn get_usb_devices(&self) -> JoinHandle<()> {
        self.script(TaskKind::UsbDevices, "devices.sh", Vec::new(), DEVICES_TIMEOUT)
    }

    /// Bring the network link up with the credentials from settings.
    pub fn connect_network(&self) -> JoinHandle<()> {
        let args = vec![
            self.settings.string_or_empty(APN_KEY),
            self.settings.string_or_empty(USERNAME_KEY),
            self.settings.string_or_empty(PASSWORD_KEY),
        ];
        let task = self
            .launcher
            .script_task(TaskKind::NetworkConnect, "connect.sh", args, CONNECT_TIMEOUT)
            .with_secret_args();
        self.launcher.launch(task)
    }

    pub fn disconnect_network(&self) -> JoinHandle<()> {
        self.script(TaskKind::NetworkDisconnect, "disconnect.sh", Vec::new(), UNBOUNDED)
    }

    pub fn host_wifi(&self) -> JoinHandle<()> {
        self.script(TaskKind::HostWifi, "hostwifi.sh", Vec::new(), NETWORK_TOOL_TIMEOUT)
    }

    pub fn kill_wifi(&self) -> JoinHandle<()> {
        self.script(TaskKind::KillWifi, "killwifi.sh", Vec::new(), NETWORK_TOOL_TIMEOUT)
    }

    pub fn start_vpn(&self) -> JoinHandle<()> {
        self.script(TaskKind::StartVpn, "startvpn.sh", Vec::new(), NETWORK_TOOL_TIMEOUT)
    }

    pub fn stop_vpn(&self) -> JoinHandle<()> {
        self.script(TaskKind::StopVpn, "stopvpn.sh", Vec::new(), NETWORK_TOOL_TIMEOUT)
    }

    /// Ask the update script whether the current branch has something new.
    pub fn check_for_update(&self) -> JoinHandle<()> {
        let branch = self.channel.branch();
        info!(branch, "checking for update");
        self.script(
            TaskKind::UpdateCheck,
            "updatecheck.sh",
            vec![branch.to_string()],
            UPDATE_TIMEOUT,
        )
    }

    pub fn update(&self) -> JoinHandle<()> {
        let branch = self.channel.branch();
        info!(branch, "updating");
        self.script(
            TaskKind::Update,
            "update.sh",
            vec![branch.to_string()],
            UPDATE_TIMEOUT,
        )
    }

    pub fn send_test_email(&self, header: EmailHeader) -> JoinHandle<()> {
        self.script(
            TaskKind::TestEmail,
            "sendtestemail.sh",
            header.into_args(),
            EMAIL_TIMEOUT,
        )
    }

    pub fn send_sale_email(&self, header: EmailHeader, sale: SaleNotice) -> JoinHandle<()> {
        let mut args = header.into_args();
        args.extend([sale.amount, sale.method, sale.remaining]);
        self.script(TaskKind::SaleEmail, "sendsaleemail.sh", args, EMAIL_TIMEOUT)
    }

    pub fn send_fill_needed_email(&self, header: EmailHeader, remaining: &str) -> JoinHandle<()> {
        let mut args = header.into_args();
        args.push(remaining.to_string());
        self.script(
            TaskKind::FillNeededEmail,
            "sendfillneededemail.sh",
            args,
            EMAIL_TIMEOUT,
        )
    }

    pub fn send_problem_email(&self, header: EmailHeader, problem: ProblemNotice) -> JoinHandle<()> {
        let mut args = header.into_args();
        args.extend([problem.code, problem.description]);
        self.script(
            TaskKind::ProblemEmail,
            "sendproblememail.sh",
            args,
            EMAIL_TIMEOUT,
        )
    }

    pub fn send_out_of_order_email(
        &self,
        header: EmailHeader,
        problem: ProblemNotice,
    ) -> JoinHandle<()> {
        let mut args = header.into_args();
        args.extend([problem.code, problem.description]);
        self.script(
            TaskKind::OutOfOrderEmail,
            "sendoutoforder.sh",
            args,
            EMAIL_TIMEOUT,
        )
    }

    fn script(
        &self,
        kind: TaskKind,
        name: &str,
        args: Vec<String>,
        timeout: Duration,
    ) -> JoinHandle<()> {
        let task: ProcessTask = self.launcher.script_task(kind, name, args, timeout);
        self.launcher.launch(task)
    }
}
