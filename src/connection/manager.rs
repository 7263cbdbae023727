// src/connection/manager.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::connection::sequencer::{ConnectionSequencer, SequencerCommand};
use crate::connection::{Connection, ConnectionId, ConnectionListener, Endpoint};
use crate::types::MatchPolicy;

/// Establishes registered connections one at a time.
///
/// This is the IO shell around [`ConnectionSequencer`]: it owns the
/// [`Connection`]s, receives their completion notifications on a channel and
/// executes the sequencer's commands. Attempt `i + 1` is never started before
/// attempt `i` has reported completion; retries are the connections' own
/// business.
pub struct ConnectionManager {
    sequencer: ConnectionSequencer,
    connections: Vec<Connection>,
    completion_tx: mpsc::UnboundedSender<ConnectionId>,
    completion_rx: mpsc::UnboundedReceiver<ConnectionId>,
    listener: Arc<dyn ConnectionListener>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("sequencer", &self.sequencer)
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    pub fn new(policy: MatchPolicy, listener: Arc<dyn ConnectionListener>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            sequencer: ConnectionSequencer::new(policy),
            connections: Vec::new(),
            completion_tx,
            completion_rx,
            listener,
        }
    }

    /// Register a connection to the given endpoint; it is attempted after
    /// every connection registered before it.
    pub fn add_connection(&mut self, endpoint: Arc<dyn Endpoint>) -> ConnectionId {
        let id = self.sequencer.register(endpoint.kind());
        let connection = Connection::new(id, endpoint, self.completion_tx.clone());
        debug!(connection = %id, kind = %connection.kind(), "connection registered");
        self.connections.push(connection);
        id
    }

    /// Start establishing connections, beginning with the first pending one.
    pub fn connect_all(&mut self) {
        info!(count = self.connections.len(), "connecting all");
        let commands = self.sequencer.start();
        self.execute(commands);
    }

    /// A connection finished (successfully or not); move on to the next one.
    pub fn connection_complete(&mut self, id: ConnectionId) {
        debug!(connection = %id, "connection complete");
        let commands = self.sequencer.complete(id);
        self.execute(commands);
    }

    /// Disconnect completed connections, in the order they completed.
    pub fn disconnect_all(&mut self) {
        info!(count = self.sequencer.completed().len(), "disconnecting all");
        for id in self.sequencer.completed() {
            if let Some(connection) = self.connections.get(id.index()) {
                connection.disconnect();
            }
        }
    }

    /// Wait for the next completion notification from any connection.
    ///
    /// Never returns `None` while the manager is alive, since it keeps a
    /// sender of its own.
    pub async fn next_completion(&mut self) -> Option<ConnectionId> {
        self.completion_rx.recv().await
    }

    /// Drive completions until the current sequence has finished.
    pub async fn run_until_complete(&mut self) {
        while !self.sequencer.is_complete() {
            match self.next_completion().await {
                Some(id) => self.connection_complete(id),
                None => break,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.sequencer.is_complete()
    }

    pub fn pending(&self) -> &[ConnectionId] {
        self.sequencer.pending()
    }

    /// Completed connections, in completion order.
    pub fn completed(&self) -> &[ConnectionId] {
        self.sequencer.completed()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.index())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn execute(&mut self, commands: Vec<SequencerCommand>) {
        for command in commands {
            match command {
                SequencerCommand::Connect(id) => {
                    if let Some(connection) = self.connections.get(id.index()) {
                        connection.connect();
                    }
                }
                SequencerCommand::AllComplete => {
                    info!(
                        completed = self.sequencer.completed().len(),
                        "all connections complete"
                    );
                    self.listener.all_connections_complete();
                }
            }
        }
    }
}
