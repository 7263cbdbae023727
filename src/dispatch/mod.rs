// src/dispatch/mod.rs

//! Issuing privileged operations and routing their results.
//!
//! Issuing and routing are split so neither side holds the other:
//!
//! - [`TaskDispatcher`] starts the named operations.
//! - [`CompletionRouter`] applies the [`routes`] table to each
//!   [`CompletedTask`](crate::exec::CompletedTask), calling the narrow
//!   collaborator traits in [`handlers`].

pub mod dispatcher;
pub mod handlers;
pub mod router;
pub mod routes;

pub use dispatcher::{EmailHeader, ProblemNotice, SaleNotice, TaskDispatcher};
pub use handlers::{
    AuditLog, DeviceDiscovery, DispatchContext, NetworkStatus, NotificationStatus,
    UpdateAvailability, UpdateChannel,
};
pub use router::CompletionRouter;
pub use routes::RECONNECTING_STATUS;
