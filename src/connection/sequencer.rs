// src/connection/sequencer.rs

//! Pure connection ordering core.
//!
//! The sequencer only knows connection ids and kinds. It consumes
//! "start" and "complete" inputs and returns [`SequencerCommand`]s describing
//! what the async shell should do next. It is intended to be unit tested
//! without any Tokio, channels or endpoints.

use tracing::debug;

use crate::connection::{ConnectionId, ConnectionKind};
use crate::types::MatchPolicy;

/// Instruction for the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerCommand {
    /// Start an attempt on this connection.
    Connect(ConnectionId),
    /// Every connection has completed; emitted once per sequence.
    AllComplete,
}

#[derive(Debug)]
pub struct ConnectionSequencer {
    policy: MatchPolicy,
    kinds: Vec<ConnectionKind>,
    pending: Vec<ConnectionId>,
    completed: Vec<ConnectionId>,
    /// The connection whose attempt is running, if any.
    in_flight: Option<ConnectionId>,
    all_complete_signalled: bool,
}

impl ConnectionSequencer {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            kinds: Vec::new(),
            pending: Vec::new(),
            completed: Vec::new(),
            in_flight: None,
            all_complete_signalled: false,
        }
    }

    /// Register a connection; it joins the back of `pending`.
    pub fn register(&mut self, kind: ConnectionKind) -> ConnectionId {
        let id = ConnectionId(self.kinds.len());
        self.kinds.push(kind);
        self.pending.push(id);
        id
    }

    /// Begin a sequence.
    ///
    /// `completed` is reset to empty; connections completed by an earlier
    /// sequence go back to `pending` in registration order. Returns the
    /// command for the first connection, or `AllComplete` if nothing is
    /// registered. A call while a sequence is running changes nothing.
    pub fn start(&mut self) -> Vec<SequencerCommand> {
        if self.in_flight.is_some() {
            debug!(in_flight = ?self.in_flight, "sequence already running; ignoring start");
            return Vec::new();
        }

        self.pending.append(&mut self.completed);
        self.pending.sort_unstable();
        self.all_complete_signalled = false;

        self.advance()
    }

    /// Record that `id` completed and return what happens next.
    ///
    /// Completions for connections that are not pending are ignored.
    pub fn complete(&mut self, id: ConnectionId) -> Vec<SequencerCommand> {
        if self.in_flight.is_none() {
            debug!(connection = %id, "no sequence running; completion ignored");
            return Vec::new();
        }

        let Some(kind) = self.kinds.get(id.0).cloned() else {
            debug!(connection = %id, "completion for unknown connection ignored");
            return Vec::new();
        };

        let policy = self.policy;
        let kinds = &self.kinds;
        let (matched, rest): (Vec<ConnectionId>, Vec<ConnectionId>) =
            self.pending.iter().copied().partition(|candidate| match policy {
                MatchPolicy::Instance => *candidate == id,
                MatchPolicy::Kind => kinds.get(candidate.0) == Some(&kind),
            });

        if matched.is_empty() {
            debug!(connection = %id, "completion for connection that is not pending ignored");
            return Vec::new();
        }

        self.pending = rest;
        self.completed.extend(matched);

        if self
            .in_flight
            .is_some_and(|running| self.pending.contains(&running))
        {
            // The running attempt belongs to someone else; keep waiting for it.
            return Vec::new();
        }

        self.in_flight = None;
        self.advance()
    }

    fn advance(&mut self) -> Vec<SequencerCommand> {
        match self.pending.first() {
            Some(&next) => {
                self.in_flight = Some(next);
                vec![SequencerCommand::Connect(next)]
            }
            None if !self.all_complete_signalled => {
                self.in_flight = None;
                self.all_complete_signalled = true;
                vec![SequencerCommand::AllComplete]
            }
            None => Vec::new(),
        }
    }

    pub fn pending(&self) -> &[ConnectionId] {
        &self.pending
    }

    /// Completed connections, in completion order.
    pub fn completed(&self) -> &[ConnectionId] {
        &self.completed
    }

    pub fn in_flight(&self) -> Option<ConnectionId> {
        self.in_flight
    }

    pub fn is_complete(&self) -> bool {
        self.all_complete_signalled
    }

    pub fn kind_of(&self, id: ConnectionId) -> Option<&ConnectionKind> {
        self.kinds.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }
}
