#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use spoolr::config::{ConfigFile, RawConfigFile};
use spoolr::connection::ConnectionPolicy;
use spoolr::types::{MatchPolicy, ProcessSupport};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the defaults with every connection and every startup
/// operation switched off, so tests opt in to what they exercise.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.network.enabled = false;
        config.devices.enabled = false;
        config.startup.clear_terminal = false;
        config.startup.check_for_update = false;
        config.startup.start_vpn = false;
        Self { config }
    }

    pub fn scripts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.system.scripts_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn process_support(mut self, support: ProcessSupport) -> Self {
        self.config.system.process_support = support;
        self
    }

    pub fn match_by(mut self, policy: MatchPolicy) -> Self {
        self.config.connections.match_by = policy;
        self
    }

    pub fn with_network(mut self, policy: ConnectionPolicy) -> Self {
        self.config.network.enabled = true;
        self.config.network.attempt_timeout = policy.attempt_timeout;
        self.config.network.reconnect_delay = policy.reconnect_delay;
        self.config.network.max_attempts = policy.max_attempts;
        self
    }

    pub fn with_devices(mut self, pattern: &str, policy: ConnectionPolicy) -> Self {
        self.config.devices.enabled = true;
        self.config.devices.pattern = pattern.to_string();
        self.config.devices.attempt_timeout = policy.attempt_timeout;
        self.config.devices.reconnect_delay = policy.reconnect_delay;
        self.config.devices.max_attempts = policy.max_attempts;
        self
    }

    pub fn check_for_update(mut self, enabled: bool) -> Self {
        self.config.startup.check_for_update = enabled;
        self
    }

    pub fn start_vpn(mut self, enabled: bool) -> Self {
        self.config.startup.start_vpn = enabled;
        self
    }

    pub fn beta(mut self, beta: bool) -> Self {
        self.config.update.beta = beta;
        self
    }

    /// Set a dotted settings key, e.g. `"network.apn"`.
    pub fn setting(mut self, key: &str, value: &str) -> Self {
        let mut parts: Vec<&str> = key.split('.').collect();
        let leaf = parts.pop().expect("settings key must not be empty");

        let mut table = &mut self.config.document;
        for part in parts {
            table = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()))
                .as_table_mut()
                .expect("settings path crosses a non-table value");
        }
        table.insert(leaf.to_string(), toml::Value::String(value.to_string()));
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConnectionPolicy`.
#[derive(Debug, Clone, Copy)]
pub struct PolicyBuilder {
    policy: ConnectionPolicy,
}

impl PolicyBuilder {
    /// No timeout, no retries.
    pub fn new() -> Self {
        Self {
            policy: ConnectionPolicy {
                attempt_timeout: Duration::ZERO,
                reconnect_delay: None,
                max_attempts: None,
            },
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.policy.attempt_timeout = timeout;
        self
    }

    pub fn reconnect_after(mut self, delay: Duration) -> Self {
        self.policy.reconnect_delay = Some(delay);
        self
    }

    pub fn max_attempts(mut self, max: u32) -> Self {
        self.policy.max_attempts = Some(max);
        self
    }

    pub fn build(self) -> ConnectionPolicy {
        self.policy
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
