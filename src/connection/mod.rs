// src/connection/mod.rs

//! Connection establishment.
//!
//! A *connection* is something the machine must reach before dependent work
//! can proceed (the cellular network link, the cash peripheral on USB, ...).
//!
//! - [`machine`] holds the per-connection state machine with its timeout and
//!   reconnect timers.
//! - [`sequencer`] is the pure ordering core: which connection runs next and
//!   when everything is complete. No Tokio, no IO.
//! - [`manager`] is the async shell owning the connections, draining their
//!   completion notifications and executing what the sequencer decides.
//!
//! Endpoint-specific work lives behind the [`Endpoint`] trait.

use std::fmt;
use std::time::Duration;

pub mod machine;
pub mod manager;
pub mod sequencer;

pub use machine::{AttemptLink, Connection};
pub use manager::ConnectionManager;
pub use sequencer::{ConnectionSequencer, SequencerCommand};

/// Opaque per-instance identity assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub(crate) usize);

impl ConnectionId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What sort of endpoint a connection reaches, e.g. `"network"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKind(String);

impl ConnectionKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a connection.
///
/// `Idle → Connecting → {Succeeded, Failed}`, `Failed → Reconnecting →
/// Connecting`. `Succeeded` and `Disconnected` are terminal until the next
/// `connect()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Succeeded,
    Failed,
    Reconnecting,
    Disconnected,
}

/// Timing policy of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionPolicy {
    /// How long one attempt may run before it is forced complete.
    /// `Duration::ZERO` disables the timeout timer.
    pub attempt_timeout: Duration,
    /// Delay before retrying after a failure; `None` means a failure is final.
    pub reconnect_delay: Option<Duration>,
    /// Upper bound on attempts (the first one included); `None` is unlimited.
    pub max_attempts: Option<u32>,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(60),
            reconnect_delay: None,
            max_attempts: None,
        }
    }
}

impl ConnectionPolicy {
    /// Whether another attempt is allowed after `attempt` failed.
    pub fn allows_retry_after(&self, attempt: u64) -> bool {
        self.reconnect_delay.is_some()
            && self
                .max_attempts
                .is_none_or(|max| attempt < u64::from(max))
    }
}

/// The endpoint-specific half of a connection.
///
/// `begin_attempt` must not block: it starts whatever check the endpoint
/// needs (usually a [`ProcessTask`](crate::exec::ProcessTask)) and later
/// resolves the attempt through the given [`AttemptLink`]. An endpoint that
/// never resolves is still completed by the attempt timeout.
pub trait Endpoint: Send + Sync {
    fn kind(&self) -> ConnectionKind;

    fn policy(&self) -> ConnectionPolicy;

    fn begin_attempt(&self, link: AttemptLink);

    fn disconnect(&self);
}

/// Receives the "every connection is complete" signal.
pub trait ConnectionListener: Send + Sync {
    fn all_connections_complete(&self);
}
