// tests/sequencer_core.rs

use spoolr::connection::{ConnectionKind, ConnectionSequencer, SequencerCommand};
use spoolr::types::MatchPolicy;

fn sequencer(kinds: &[&str], policy: MatchPolicy) -> ConnectionSequencer {
    let mut seq = ConnectionSequencer::new(policy);
    for kind in kinds {
        seq.register(ConnectionKind::from(*kind));
    }
    seq
}

#[test]
fn test_start_connects_only_the_first_pending() {
    let mut seq = sequencer(&["network", "devices"], MatchPolicy::Instance);
    let ids = seq.pending().to_vec();

    assert_eq!(seq.start(), vec![SequencerCommand::Connect(ids[0])]);
    assert_eq!(seq.in_flight(), Some(ids[0]));
    assert!(seq.completed().is_empty());
    assert_eq!(seq.kind_of(ids[1]).map(|k| k.as_str()), Some("devices"));
}

#[test]
fn test_complete_advances_then_signals_once() {
    let mut seq = sequencer(&["network", "devices"], MatchPolicy::Instance);
    let ids = seq.pending().to_vec();
    seq.start();

    assert_eq!(seq.complete(ids[0]), vec![SequencerCommand::Connect(ids[1])]);
    assert_eq!(seq.complete(ids[1]), vec![SequencerCommand::AllComplete]);
    assert!(seq.is_complete());
    assert_eq!(seq.completed(), &[ids[0], ids[1]]);

    assert!(seq.complete(ids[1]).is_empty());
    assert!(seq.complete(ids[0]).is_empty());
}

#[test]
fn test_completion_before_start_is_ignored() {
    let mut seq = sequencer(&["network"], MatchPolicy::Instance);
    let id = seq.pending()[0];

    assert!(seq.complete(id).is_empty());
    assert_eq!(seq.pending(), &[id]);
}

#[test]
fn test_completion_of_waiting_connection_does_not_advance() {
    // A pending connection that is not the running one reports completion;
    // the sequence still waits for the running attempt.
    let mut seq = sequencer(&["network", "devices", "devices"], MatchPolicy::Instance);
    let ids = seq.pending().to_vec();
    seq.start();

    assert!(seq.complete(ids[2]).is_empty());
    assert_eq!(seq.in_flight(), Some(ids[0]));
    assert_eq!(seq.pending(), &[ids[0], ids[1]]);
    assert_eq!(seq.completed(), &[ids[2]]);
}

#[test]
fn test_kind_policy_sweeps_same_kind() {
    let mut seq = sequencer(&["modem", "modem", "devices"], MatchPolicy::Kind);
    let ids = seq.pending().to_vec();
    seq.start();

    assert_eq!(seq.complete(ids[0]), vec![SequencerCommand::Connect(ids[2])]);
    assert_eq!(seq.completed(), &[ids[0], ids[1]]);
}

#[test]
fn test_restart_requeues_in_registration_order() {
    let mut seq = sequencer(&["a", "b", "c"], MatchPolicy::Instance);
    let ids = seq.pending().to_vec();
    seq.start();
    for id in &ids {
        seq.complete(*id);
    }
    assert!(seq.pending().is_empty());

    assert_eq!(seq.start(), vec![SequencerCommand::Connect(ids[0])]);
    assert_eq!(seq.pending(), ids.as_slice());
    assert!(seq.completed().is_empty());
    assert!(!seq.is_complete());
}

#[test]
fn test_start_while_running_changes_nothing() {
    let mut seq = sequencer(&["a", "b"], MatchPolicy::Instance);
    let ids = seq.pending().to_vec();
    seq.start();
    seq.complete(ids[0]);

    assert!(seq.start().is_empty());
    assert_eq!(seq.in_flight(), Some(ids[1]));
    assert_eq!(seq.completed(), &[ids[0]]);
}

#[test]
fn test_empty_sequencer_completes_on_start() {
    let mut seq = ConnectionSequencer::new(MatchPolicy::Instance);
    assert!(seq.is_empty());
    assert_eq!(seq.start(), vec![SequencerCommand::AllComplete]);
    assert!(seq.is_complete());
    // Every start is a new sequence with its own signal.
    assert_eq!(seq.start(), vec![SequencerCommand::AllComplete]);
}
