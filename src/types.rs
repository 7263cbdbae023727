use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Whether this host may spawn external processes.
///
/// - `Auto`: spawn on unix targets, complete immediately elsewhere.
/// - `Enabled` / `Disabled`: force the decision (useful on development
///   machines without the machine's scripts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessSupport {
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl ProcessSupport {
    pub fn is_available(self) -> bool {
        match self {
            ProcessSupport::Auto => cfg!(unix),
            ProcessSupport::Enabled => true,
            ProcessSupport::Disabled => false,
        }
    }
}

impl FromStr for ProcessSupport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ProcessSupport::Auto),
            "enabled" | "on" => Ok(ProcessSupport::Enabled),
            "disabled" | "off" => Ok(ProcessSupport::Disabled),
            other => Err(format!(
                "invalid process_support: {other} (expected \"auto\", \"enabled\" or \"disabled\")"
            )),
        }
    }
}

/// How the connection manager decides which pending entries a completion
/// refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Only the connection that reported completion.
    #[default]
    Instance,
    /// Every pending connection sharing the reporter's kind.
    ///
    /// Connections of the same kind that never ran are marked complete too,
    /// so this is only sensible when each kind is registered once.
    Kind,
}

/// Identity of a supervised process invocation.
///
/// Completions are routed by this value rather than by inspecting the
/// command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    ClearTerminal,
    Shutdown,
    Restart,
    Reset,
    UsbDevices,
    NetworkConnect,
    NetworkDisconnect,
    HostWifi,
    KillWifi,
    StartVpn,
    StopVpn,
    UpdateCheck,
    Update,
    TestEmail,
    SaleEmail,
    FillNeededEmail,
    ProblemEmail,
    OutOfOrderEmail,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::ClearTerminal => "clear-terminal",
            TaskKind::Shutdown => "shutdown",
            TaskKind::Restart => "restart",
            TaskKind::Reset => "reset",
            TaskKind::UsbDevices => "usb-devices",
            TaskKind::NetworkConnect => "network-connect",
            TaskKind::NetworkDisconnect => "network-disconnect",
            TaskKind::HostWifi => "host-wifi",
            TaskKind::KillWifi => "kill-wifi",
            TaskKind::StartVpn => "start-vpn",
            TaskKind::StopVpn => "stop-vpn",
            TaskKind::UpdateCheck => "update-check",
            TaskKind::Update => "update",
            TaskKind::TestEmail => "test-email",
            TaskKind::SaleEmail => "sale-email",
            TaskKind::FillNeededEmail => "fill-needed-email",
            TaskKind::ProblemEmail => "problem-email",
            TaskKind::OutOfOrderEmail => "out-of-order-email",
        }
    }

    pub fn is_email(self) -> bool {
        matches!(
            self,
            TaskKind::TestEmail
                | TaskKind::SaleEmail
                | TaskKind::FillNeededEmail
                | TaskKind::ProblemEmail
                | TaskKind::OutOfOrderEmail
        )
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
