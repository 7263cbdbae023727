// src/dispatch/handlers.rs

//! Collaborators that consume task output.
//!
//! Each trait is the narrow slice of a domain object that the routing table
//! needs. Implementations must tolerate being called in any order relative to
//! each other: tasks complete independently.

use std::fmt;
use std::sync::Arc;

/// Network link status, as reported by the connect/disconnect scripts.
pub trait NetworkStatus: Send + Sync {
    /// Store the raw output of a network script.
    fn set_status_value(&self, raw: &str);

    /// Whether the stored status equals `value`.
    fn has_status_value(&self, value: &str) -> bool;

    /// Re-evaluate the stored status and resolve any pending attempt.
    fn check_if_connected(&self);
}

pub trait UpdateAvailability: Send + Sync {
    fn set_update_available(&self, available: bool);
}

/// Which update branch to follow. The policy itself lives elsewhere.
pub trait UpdateChannel: Send + Sync {
    fn beta_mode(&self) -> bool;

    fn branch(&self) -> &'static str {
        if self.beta_mode() { "beta" } else { "master" }
    }
}

/// Delivery status of the last notification email.
pub trait NotificationStatus: Send + Sync {
    fn set_status(&self, raw: &str);
}

/// Consumer of the attached-hardware listing.
pub trait DeviceDiscovery: Send + Sync {
    fn devices_reported(&self, raw: &str);
}

/// Plain-text audit trail for privileged operations. Fire and forget.
pub trait AuditLog: Send + Sync {
    fn write_log(&self, line: &str);
}

/// Handles the routing table hands output to.
#[derive(Clone)]
pub struct DispatchContext {
    pub network: Arc<dyn NetworkStatus>,
    pub updates: Arc<dyn UpdateAvailability>,
    pub notifications: Arc<dyn NotificationStatus>,
    pub devices: Arc<dyn DeviceDiscovery>,
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext").finish_non_exhaustive()
    }
}
