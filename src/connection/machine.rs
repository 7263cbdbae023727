// src/connection/machine.rs

//! Per-connection state machine.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{
    ConnectionId, ConnectionKind, ConnectionPolicy, ConnectionState, Endpoint,
};
use crate::timer::{TimerSlot, TimerToken};

/// One registered connection.
///
/// Cheap to clone; all clones drive the same state machine. Completion is
/// reported to the owning manager by sending the connection's id on the
/// notifier channel, at most once per attempt.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

struct Shared {
    id: ConnectionId,
    kind: ConnectionKind,
    policy: ConnectionPolicy,
    endpoint: Arc<dyn Endpoint>,
    notifier: mpsc::UnboundedSender<ConnectionId>,
    machine: Mutex<Machine>,
}

#[derive(Debug)]
struct Machine {
    state: ConnectionState,
    attempt: u64,
    reported_attempt: Option<u64>,
    timeout: TimerSlot,
    reconnect: TimerSlot,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        endpoint: Arc<dyn Endpoint>,
        notifier: mpsc::UnboundedSender<ConnectionId>,
    ) -> Self {
        let machine = Machine {
            state: ConnectionState::Idle,
            attempt: 0,
            reported_attempt: None,
            timeout: TimerSlot::new("connection-timeout"),
            reconnect: TimerSlot::new("connection-reconnect"),
        };

        Self {
            shared: Arc::new(Shared {
                id,
                kind: endpoint.kind(),
                policy: endpoint.policy(),
                endpoint,
                notifier,
                machine: Mutex::new(machine),
            }),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }

    pub fn kind(&self) -> &ConnectionKind {
        &self.shared.kind
    }

    pub fn policy(&self) -> ConnectionPolicy {
        self.shared.policy
    }

    pub fn state(&self) -> ConnectionState {
        self.machine().state
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.machine().attempt
    }

    pub fn timeout_armed(&self) -> bool {
        self.machine().timeout.is_armed()
    }

    pub fn reconnect_armed(&self) -> bool {
        self.machine().reconnect.is_armed()
    }

    /// Start a fresh attempt.
    ///
    /// Arms (or replaces) the timeout timer, then hands an [`AttemptLink`] to
    /// the endpoint. The endpoint is called without holding the state lock, so
    /// it may resolve the attempt synchronously.
    pub fn connect(&self) {
        self.begin_attempt(true);
    }

    /// Retry after a failure; normally invoked by the reconnect timer.
    ///
    /// The deadline armed by [`connect`](Self::connect) keeps running across
    /// retries, so a connection that keeps failing still reports completion
    /// once it passes.
    pub fn reconnect(&self) {
        info!(
            connection = %self.shared.id,
            kind = %self.shared.kind,
            "reconnecting"
        );
        self.begin_attempt(false);
    }

    fn begin_attempt(&self, arm_timeout: bool) {
        let link = {
            let mut machine = self.machine();
            machine.reconnect.cancel();
            machine.attempt += 1;
            machine.state = ConnectionState::Connecting;

            if arm_timeout {
                let timeout = self.shared.policy.attempt_timeout;
                if timeout.is_zero() {
                    machine.timeout.cancel();
                } else {
                    let weak = Arc::downgrade(&self.shared);
                    machine.timeout.start(timeout, move |token| {
                        if let Some(shared) = weak.upgrade() {
                            Connection { shared }.timeout_elapsed(token);
                        }
                    });
                }
            }

            info!(
                connection = %self.shared.id,
                kind = %self.shared.kind,
                attempt = machine.attempt,
                "connecting"
            );

            AttemptLink {
                connection: Arc::downgrade(&self.shared),
                attempt: machine.attempt,
            }
        };

        self.shared.endpoint.begin_attempt(link);
    }

    /// Tear the connection down and stop both timers.
    pub fn disconnect(&self) {
        {
            let mut machine = self.machine();
            machine.timeout.cancel();
            machine.reconnect.cancel();
            machine.state = ConnectionState::Disconnected;
        }

        info!(
            connection = %self.shared.id,
            kind = %self.shared.kind,
            "disconnecting"
        );
        self.shared.endpoint.disconnect();
    }

    fn connection_successful(&self, attempt: u64) {
        {
            let mut machine = self.machine();
            if !Self::resolvable(&machine, attempt) {
                debug!(
                    connection = %self.shared.id,
                    attempt,
                    current = machine.attempt,
                    "ignoring success of a stale attempt"
                );
                return;
            }
            machine.state = ConnectionState::Succeeded;
        }

        info!(connection = %self.shared.id, kind = %self.shared.kind, attempt, "connection succeeded");
        self.connection_complete(attempt);
    }

    fn connection_failed(&self, attempt: u64) {
        let retry = {
            let mut machine = self.machine();
            if !Self::resolvable(&machine, attempt) {
                debug!(
                    connection = %self.shared.id,
                    attempt,
                    current = machine.attempt,
                    "ignoring failure of a stale attempt"
                );
                return;
            }
            machine.state = ConnectionState::Failed;

            match self.shared.policy.reconnect_delay {
                Some(delay) if self.shared.policy.allows_retry_after(attempt) => {
                    machine.state = ConnectionState::Reconnecting;
                    let weak = Arc::downgrade(&self.shared);
                    machine.reconnect.start(delay, move |token| {
                        if let Some(shared) = weak.upgrade() {
                            Connection { shared }.reconnect_due(token);
                        }
                    });
                    Some(delay)
                }
                _ => None,
            }
        };

        match retry {
            Some(delay) => {
                warn!(
                    connection = %self.shared.id,
                    kind = %self.shared.kind,
                    attempt,
                    ?delay,
                    "connection failed; retry scheduled"
                );
            }
            None => {
                warn!(
                    connection = %self.shared.id,
                    kind = %self.shared.kind,
                    attempt,
                    "connection failed permanently"
                );
                self.connection_complete(attempt);
            }
        }
    }

    /// Stop the timeout timer and tell the manager, once per attempt.
    fn connection_complete(&self, attempt: u64) {
        {
            let mut machine = self.machine();
            machine.timeout.cancel();
            if machine.reported_attempt.is_some_and(|reported| reported >= attempt) {
                return;
            }
            machine.reported_attempt = Some(attempt);
        }

        debug!(connection = %self.shared.id, attempt, "reporting completion");
        if self.shared.notifier.send(self.shared.id).is_err() {
            debug!(
                connection = %self.shared.id,
                "connection manager is gone; completion dropped"
            );
        }
    }

    fn timeout_elapsed(&self, token: TimerToken) {
        let attempt = {
            let mut machine = self.machine();
            if !machine.timeout.take_if_current(token) {
                return;
            }
            machine.attempt
        };

        warn!(
            connection = %self.shared.id,
            kind = %self.shared.kind,
            attempt,
            "attempt timed out; treating connection as complete"
        );
        self.connection_complete(attempt);
    }

    fn reconnect_due(&self, token: TimerToken) {
        {
            let mut machine = self.machine();
            if !machine.reconnect.take_if_current(token)
                || machine.state != ConnectionState::Reconnecting
            {
                return;
            }
        }
        self.reconnect();
    }

    fn resolvable(machine: &Machine, attempt: u64) -> bool {
        machine.attempt == attempt && machine.state == ConnectionState::Connecting
    }

    fn machine(&self) -> MutexGuard<'_, Machine> {
        self.shared
            .machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.shared.id)
            .field("kind", &self.shared.kind)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Handle through which an [`Endpoint`] resolves one attempt.
///
/// Holds only a weak reference, so endpoints may keep links around without
/// keeping the connection alive. Resolving a link whose attempt has been
/// superseded is a no-op.
#[derive(Clone)]
pub struct AttemptLink {
    connection: Weak<Shared>,
    attempt: u64,
}

impl AttemptLink {
    /// 1 for the first attempt, 2 for the first reconnect, ...
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.upgrade().map(|shared| shared.id)
    }

    /// Whether this attempt is still the one in progress.
    pub fn is_current(&self) -> bool {
        self.connection.upgrade().is_some_and(|shared| {
            let machine = shared.machine.lock().unwrap_or_else(PoisonError::into_inner);
            Connection::resolvable(&machine, self.attempt)
        })
    }

    pub fn succeeded(&self) {
        if let Some(shared) = self.connection.upgrade() {
            Connection { shared }.connection_successful(self.attempt);
        }
    }

    pub fn failed(&self) {
        if let Some(shared) = self.connection.upgrade() {
            Connection { shared }.connection_failed(self.attempt);
        }
    }
}

impl fmt::Debug for AttemptLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptLink")
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}
