//! TBTP history integration tests
//!
//! Tests the per-beam bounded TBTP storage of a configured sequence.

use integration_tests::{init_test_logging, TestScenario};
use satlink_common::SequenceConfig;
use satlink_rtn::{SuperframeSequence, TbtpMessage, MIN_TBTP_STORE_COUNT};

fn sequence(store_time_ms: u64) -> SuperframeSequence {
    let mut scenario = TestScenario::default();
    scenario.config.sequence = SequenceConfig {
        tbtp_store_time_ms: store_time_ms,
        ..scenario.config.sequence
    };
    scenario.sequence().expect("Failed to build sequence")
}

fn tbtp(sequence: &SuperframeSequence, counter: u16) -> TbtpMessage {
    let superframe = sequence.superframe_conf(0).unwrap();
    let mut msg = TbtpMessage::new(0, counter);
    let slots = superframe.frame_conf(0).unwrap().time_slot_ids(0).unwrap();
    msg.assign_time_slot(counter, 0, slots[counter as usize % slots.len()]);
    msg.add_ra_channel(0);
    msg
}

#[test]
fn test_store_count_from_store_time() {
    init_test_logging();

    let seq = sequence(1000);
    let duration = seq.duration_s(0).unwrap();
    let expected = (1.0 / duration).floor() as usize;
    assert_eq!(seq.tbtp_store_count().unwrap(), expected.max(MIN_TBTP_STORE_COUNT));

    let seq = sequence(50);
    assert_eq!(seq.tbtp_store_count().unwrap(), MIN_TBTP_STORE_COUNT);
}

#[test]
fn test_retransmission_window() {
    init_test_logging();

    let mut seq = sequence(1000);
    let capacity = seq.tbtp_store_count().unwrap();
    let total = capacity as u16 + 5;

    for counter in 0..total {
        let msg = tbtp(&seq, counter);
        let id = seq.add_tbtp_message(7, msg).unwrap();
        assert_eq!(id, counter as u32);
    }

    // the oldest five are gone
    for id in 0..5 {
        assert!(seq.tbtp_message(7, id).is_none());
    }
    for id in 5..total as u32 {
        let msg = seq.tbtp_message(7, id).expect("TBTP should still be stored");
        assert_eq!(msg.superframe_counter() as u32, id);
        assert_eq!(msg.time_slots(id as u16).len(), 1);
        assert_eq!(msg.ra_channels(), &[0]);
    }
    assert!(seq.tbtp_message(7, total as u32).is_none());
}

#[test]
fn test_beams_are_independent() {
    let mut seq = sequence(300);
    let first = tbtp(&seq, 1);
    let second = tbtp(&seq, 2);

    assert_eq!(seq.add_tbtp_message(1, first.clone()).unwrap(), 0);
    assert_eq!(seq.add_tbtp_message(2, second).unwrap(), 0);
    assert_eq!(seq.add_tbtp_message(1, first).unwrap(), 1);

    assert_eq!(seq.tbtp_message(1, 1).unwrap().superframe_counter(), 1);
    assert_eq!(seq.tbtp_message(2, 0).unwrap().superframe_counter(), 2);
    assert!(seq.tbtp_message(2, 1).is_none());
    assert!(seq.tbtp_message(3, 0).is_none());
}
