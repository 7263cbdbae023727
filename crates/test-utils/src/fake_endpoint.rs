#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spoolr::connection::{AttemptLink, ConnectionKind, ConnectionListener, ConnectionPolicy, Endpoint};

/// Shared, ordered log of what fakes observed, e.g. `"connect(A)"`.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

/// How a [`FakeEndpoint`] resolves one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Succeed,
    Fail,
    /// Never resolve; only the attempt timeout can complete it.
    Hang,
    /// Keep the link; the test resolves it with [`FakeEndpoint::resolve`].
    Manual,
}

/// Endpoint that resolves attempts from a script of [`Resolution`]s.
///
/// Attempts beyond the script use the fallback resolution (default
/// `Succeed`). Every call is recorded in the shared [`Trace`].
pub struct FakeEndpoint {
    name: String,
    kind: ConnectionKind,
    policy: ConnectionPolicy,
    script: Mutex<VecDeque<Resolution>>,
    fallback: Resolution,
    held: Mutex<Option<AttemptLink>>,
    trace: Trace,
}

impl FakeEndpoint {
    pub fn new(name: &str, trace: &Trace) -> Self {
        Self {
            name: name.to_string(),
            kind: ConnectionKind::new(name),
            policy: ConnectionPolicy {
                attempt_timeout: Duration::ZERO,
                reconnect_delay: None,
                max_attempts: None,
            },
            script: Mutex::new(VecDeque::new()),
            fallback: Resolution::Succeed,
            held: Mutex::new(None),
            trace: trace.clone(),
        }
    }

    /// Override the kind (defaults to the name).
    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = ConnectionKind::new(kind);
        self
    }

    pub fn with_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn resolutions(self, resolutions: &[Resolution]) -> Self {
        self.script.lock().unwrap().extend(resolutions.iter().copied());
        self
    }

    pub fn otherwise(mut self, fallback: Resolution) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Resolve the attempt held by a `Manual` resolution.
    pub fn resolve(&self, success: bool) {
        let link = self.held.lock().unwrap().take();
        if let Some(link) = link {
            self.finish(&link, success);
        }
    }

    pub fn held_link(&self) -> Option<AttemptLink> {
        self.held.lock().unwrap().clone()
    }

    fn finish(&self, link: &AttemptLink, success: bool) {
        if success {
            self.trace.push(format!("succeed({})", self.name));
            link.succeeded();
        } else {
            self.trace.push(format!("fail({})", self.name));
            link.failed();
        }
    }
}

impl Endpoint for FakeEndpoint {
    fn kind(&self) -> ConnectionKind {
        self.kind.clone()
    }

    fn policy(&self) -> ConnectionPolicy {
        self.policy
    }

    fn begin_attempt(&self, link: AttemptLink) {
        if link.attempt() > 1 {
            self.trace.push(format!("reconnect({})", self.name));
        }
        self.trace.push(format!("connect({})", self.name));

        let resolution = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        match resolution {
            Resolution::Succeed => self.finish(&link, true),
            Resolution::Fail => self.finish(&link, false),
            Resolution::Hang => {}
            Resolution::Manual => *self.held.lock().unwrap() = Some(link),
        }
    }

    fn disconnect(&self) {
        self.trace.push(format!("disconnect({})", self.name));
    }
}

/// Listener that records `"all-complete"` into a trace and counts calls.
#[derive(Debug, Clone, Default)]
pub struct TraceListener {
    trace: Trace,
}

impl TraceListener {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }

    pub fn fired(&self) -> usize {
        self.trace.count("all-complete")
    }
}

impl ConnectionListener for TraceListener {
    fn all_connections_complete(&self) {
        self.trace.push("all-complete");
    }
}
