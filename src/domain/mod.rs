// src/domain/mod.rs

//! Concrete collaborators of the machine: the endpoints the connection
//! manager sequences and the sinks the routing table writes into.

pub mod audit;
pub mod devices;
pub mod network;
pub mod notifications;
pub mod updates;

pub use audit::TracingAudit;
pub use devices::{DEVICES_KIND, DeviceLink, UnmonitoredDevices};
pub use network::{NETWORK_KIND, NetworkLink, parse_status};
pub use notifications::NotificationLog;
pub use updates::UpdateState;
