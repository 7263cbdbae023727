// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::duration;
use crate::config::settings::TomlSettings;
use crate::connection::ConnectionPolicy;
use crate::types::{MatchPolicy, ProcessSupport};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [system]
/// scripts_dir = "scripts"
///
/// [network]
/// apn = "internet"
/// attempt_timeout = "180s"
/// reconnect_delay = "30s"
///
/// [devices]
/// pattern = "(?i)bill acceptor"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub system: SystemSection,

    #[serde(default)]
    pub connections: ConnectionsSection,

    #[serde(default)]
    pub network: NetworkSection,

    #[serde(default)]
    pub devices: DevicesSection,

    #[serde(default)]
    pub update: UpdateSection,

    #[serde(default)]
    pub startup: StartupSection,

    /// The whole document, kept for dotted-key lookups through
    /// [`Settings`](crate::config::Settings).
    #[serde(skip)]
    pub document: toml::Table,
}

/// Validated configuration. Obtain one through
/// [`load_and_validate`](crate::config::load_and_validate) or
/// `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub system: SystemSection,
    pub connections: ConnectionsSection,
    pub network: NetworkSection,
    pub devices: DevicesSection,
    pub update: UpdateSection,
    pub startup: StartupSection,
    document: toml::Table,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            system: raw.system,
            connections: raw.connections,
            network: raw.network,
            devices: raw.devices,
            update: raw.update,
            startup: raw.startup,
            document: raw.document,
        }
    }

    /// Named settings view over the loaded document.
    pub fn settings(&self) -> TomlSettings {
        TomlSettings::new(self.document.clone())
    }
}

/// `[system]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemSection {
    /// Directory holding the machine's shell scripts. Scripts run with this
    /// directory as their working directory.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    #[serde(default)]
    pub process_support: ProcessSupport,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

impl Default for SystemSection {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            process_support: ProcessSupport::default(),
        }
    }
}

/// `[connections]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionsSection {
    #[serde(default)]
    pub match_by: MatchPolicy,
}

/// `[network]` section.
///
/// Credentials (`apn`, `username`, `password`) are not part of the typed
/// model; they are read through the settings view when the connect script is
/// launched.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Status line the connect/disconnect scripts print when the link is up.
    #[serde(default = "default_connected_status")]
    pub connected_status: String,

    #[serde(default = "default_network_timeout", deserialize_with = "duration::deserialize")]
    pub attempt_timeout: Duration,

    #[serde(default = "default_network_reconnect", deserialize_with = "duration::deserialize_opt")]
    pub reconnect_delay: Option<Duration>,

    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_true() -> bool {
    true
}

fn default_connected_status() -> String {
    "Connected".to_string()
}

fn default_network_timeout() -> Duration {
    Duration::from_secs(180)
}

fn default_network_reconnect() -> Option<Duration> {
    Some(Duration::from_secs(30))
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            enabled: true,
            connected_status: default_connected_status(),
            attempt_timeout: default_network_timeout(),
            reconnect_delay: default_network_reconnect(),
            max_attempts: None,
        }
    }
}

impl NetworkSection {
    pub fn policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            attempt_timeout: self.attempt_timeout,
            reconnect_delay: self.reconnect_delay,
            max_attempts: self.max_attempts,
        }
    }
}

/// `[devices]` section: discovery of the cash peripheral on the USB bus.
#[derive(Debug, Clone, Deserialize)]
pub struct DevicesSection {
    #[serde(default)]
    pub enabled: bool,

    /// Regex matched against each line printed by the device listing script.
    #[serde(default = "default_device_pattern")]
    pub pattern: String,

    #[serde(default = "default_device_timeout", deserialize_with = "duration::deserialize")]
    pub attempt_timeout: Duration,

    #[serde(default = "default_device_reconnect", deserialize_with = "duration::deserialize_opt")]
    pub reconnect_delay: Option<Duration>,

    #[serde(default = "default_device_attempts")]
    pub max_attempts: Option<u32>,
}

fn default_device_pattern() -> String {
    "(?i)bill acceptor".to_string()
}

fn default_device_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_device_reconnect() -> Option<Duration> {
    Some(Duration::from_secs(15))
}

fn default_device_attempts() -> Option<u32> {
    Some(3)
}

impl Default for DevicesSection {
    fn default() -> Self {
        Self {
            enabled: false,
            pattern: default_device_pattern(),
            attempt_timeout: default_device_timeout(),
            reconnect_delay: default_device_reconnect(),
            max_attempts: default_device_attempts(),
        }
    }
}

impl DevicesSection {
    pub fn policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            attempt_timeout: self.attempt_timeout,
            reconnect_delay: self.reconnect_delay,
            max_attempts: self.max_attempts,
        }
    }
}

/// `[update]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSection {
    /// Follow the beta branch instead of master.
    #[serde(default)]
    pub beta: bool,
}

/// `[startup]` section: operations issued when the supervisor starts and once
/// every connection is complete.
#[derive(Debug, Clone, Deserialize)]
pub struct StartupSection {
    /// Clear the console before connecting.
    #[serde(default = "default_true")]
    pub clear_terminal: bool,

    /// Run `updatecheck.sh` once every connection is complete.
    #[serde(default = "default_true")]
    pub check_for_update: bool,

    #[serde(default)]
    pub start_vpn: bool,
}

impl Default for StartupSection {
    fn default() -> Self {
        Self {
            clear_terminal: true,
            check_for_update: true,
            start_vpn: false,
        }
    }
}
