// src/domain/network.rs

//! The cellular network link.
//!
//! Each attempt runs `connect.sh`; the script's last non-empty output line is
//! the link status. The attempt succeeds when that status equals the
//! configured connected status and fails otherwise.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::connection::{AttemptLink, ConnectionKind, ConnectionPolicy, Endpoint};
use crate::dispatch::{NetworkStatus, RECONNECTING_STATUS, TaskDispatcher};

pub const NETWORK_KIND: &str = "network";

#[derive(Debug, Default)]
struct LinkState {
    status: String,
    pending: Option<AttemptLink>,
}

#[derive(Debug)]
pub struct NetworkLink {
    dispatcher: TaskDispatcher,
    policy: ConnectionPolicy,
    connected_status: String,
    state: Mutex<LinkState>,
}

impl NetworkLink {
    pub fn new(
        dispatcher: TaskDispatcher,
        policy: ConnectionPolicy,
        connected_status: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            policy,
            connected_status: connected_status.into(),
            state: Mutex::new(LinkState::default()),
        }
    }

    /// The status last reported by a network script.
    pub fn status(&self) -> String {
        self.lock().status.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.has_status_value(&self.connected_status)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Last non-empty line of a script's output, trimmed.
pub fn parse_status(raw: &str) -> &str {
    raw.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("")
}

impl NetworkStatus for NetworkLink {
    fn set_status_value(&self, raw: &str) {
        let status = parse_status(raw).to_string();
        debug!(%status, "network status");
        self.lock().status = status;
    }

    fn has_status_value(&self, value: &str) -> bool {
        self.lock().status == value
    }

    fn check_if_connected(&self) {
        let (link, connected) = {
            let mut state = self.lock();
            let connected = state.status == self.connected_status;
            (state.pending.take(), connected)
        };

        let Some(link) = link else {
            debug!("no network attempt waiting for a status");
            return;
        };

        if connected {
            info!(attempt = link.attempt(), "network connected");
            link.succeeded();
        } else {
            warn!(attempt = link.attempt(), status = %self.status(), "network not connected");
            link.failed();
        }
    }
}

impl Endpoint for NetworkLink {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::new(NETWORK_KIND)
    }

    fn policy(&self) -> ConnectionPolicy {
        self.policy
    }

    fn begin_attempt(&self, link: AttemptLink) {
        {
            let mut state = self.lock();
            if link.attempt() > 1 {
                state.status = RECONNECTING_STATUS.to_string();
            }
            state.pending = Some(link);
        }
        self.dispatcher.connect_network();
    }

    fn disconnect(&self) {
        self.lock().pending = None;
        self.dispatcher.disconnect_network();
    }
}
