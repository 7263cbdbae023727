// src/domain/devices.rs

//! The cash peripheral, discovered through the USB device listing.

use std::sync::Mutex;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::connection::{AttemptLink, ConnectionKind, ConnectionPolicy, Endpoint};
use crate::dispatch::{DeviceDiscovery, TaskDispatcher};

pub const DEVICES_KIND: &str = "devices";

#[derive(Debug, Default)]
struct DeviceState {
    listing: Vec<String>,
    pending: Option<AttemptLink>,
}

/// Succeeds an attempt when a line of `devices.sh` output matches `pattern`.
#[derive(Debug)]
pub struct DeviceLink {
    dispatcher: TaskDispatcher,
    policy: ConnectionPolicy,
    pattern: Regex,
    state: Mutex<DeviceState>,
}

impl DeviceLink {
    pub fn new(dispatcher: TaskDispatcher, policy: ConnectionPolicy, pattern: Regex) -> Self {
        Self {
            dispatcher,
            policy,
            pattern,
            state: Mutex::new(DeviceState::default()),
        }
    }

    /// Device lines from the latest listing.
    pub fn listing(&self) -> Vec<String> {
        self.lock().listing.clone()
    }

    pub fn is_present(&self) -> bool {
        self.lock()
            .listing
            .iter()
            .any(|line| self.pattern.is_match(line))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeviceDiscovery for DeviceLink {
    fn devices_reported(&self, raw: &str) {
        let listing: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let found = listing.iter().any(|line| self.pattern.is_match(line));
        debug!(devices = listing.len(), found, "device listing");

        let link = {
            let mut state = self.lock();
            state.listing = listing;
            state.pending.take()
        };

        match link {
            Some(link) if found => {
                info!(attempt = link.attempt(), "device present");
                link.succeeded();
            }
            Some(link) => {
                warn!(attempt = link.attempt(), pattern = %self.pattern, "device not found");
                link.failed();
            }
            None => {}
        }
    }
}

impl Endpoint for DeviceLink {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::new(DEVICES_KIND)
    }

    fn policy(&self) -> ConnectionPolicy {
        self.policy
    }

    fn begin_attempt(&self, link: AttemptLink) {
        self.lock().pending = Some(link);
        self.dispatcher.get_usb_devices();
    }

    fn disconnect(&self) {
        self.lock().pending = None;
    }
}

/// Device listings when no peripheral is monitored.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmonitoredDevices;

impl DeviceDiscovery for UnmonitoredDevices {
    fn devices_reported(&self, raw: &str) {
        debug!(lines = raw.lines().count(), "device listing ignored; devices disabled");
    }
}
