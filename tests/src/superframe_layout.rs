//! Superframe layout integration tests
//!
//! Checks carrier id flattening, carrier frequencies and RA channels of the
//! preset superframes built on the reference waveform table.

use integration_tests::{assert_close, init_test_logging, TestScenario};
use satlink_common::{CarrierBandwidthType, ConfigType, Error, SuperframeConfig, SuperframePreset};
use satlink_rtn::Superframe;

#[test]
fn test_carrier_frequency_additivity() {
    init_test_logging();

    let scenario = TestScenario::default();
    let mut sequence = scenario.sequence().expect("Failed to build sequence");
    let second = Superframe::configure(
        &SuperframeConfig::from_preset(SuperframePreset::Config1),
        scenario.config.sequence.allocated_bandwidth_hz,
        sequence.target_duration_s(),
        sequence.waveform_conf(),
    )
    .expect("Failed to configure second superframe");
    sequence.add_superframe(second);

    let mut expected_id = 0;
    let mut superframe_start_hz = 0.0;
    for sf_id in 0..sequence.superframe_count() {
        let superframe = sequence.superframe_conf(sf_id).unwrap();
        let mut frame_start_hz = superframe_start_hz;
        for (frame_id, frame) in superframe.frames().iter().enumerate() {
            for carrier in 0..frame.carrier_count() {
                let id = sequence.carrier_id(sf_id, frame_id, carrier).unwrap();
                assert_eq!(id, expected_id);
                expected_id += 1;

                let local = frame.carrier_frequency_hz(carrier).unwrap();
                assert_close(
                    sequence.carrier_frequency_hz(id).unwrap(),
                    frame_start_hz + local,
                    1e-3,
                );
                assert_eq!(
                    sequence
                        .carrier_bandwidth_hz(id, CarrierBandwidthType::Occupied)
                        .unwrap(),
                    frame.carrier_bandwidth_hz(CarrierBandwidthType::Occupied)
                );
            }
            frame_start_hz += frame.bandwidth_hz();
        }
        superframe_start_hz += superframe.bandwidth_hz();
    }
    assert_eq!(expected_id, sequence.carrier_count());
    assert!(sequence.carrier_frequency_hz(expected_id).is_err());
}

#[test]
fn test_preset_ra_channels() {
    init_test_logging();

    for preset in [
        SuperframePreset::Config0,
        SuperframePreset::Config1,
        SuperframePreset::Config2,
    ] {
        let sequence = TestScenario::default()
            .with_preset(preset)
            .sequence()
            .expect("Failed to build sequence");
        let superframe = sequence.superframe_conf(0).unwrap();

        assert_eq!(superframe.ra_channel_count(), 1);
        assert_eq!(superframe.ra_channel_frame_id(0).unwrap(), 1);

        let ra_carrier = superframe.carrier_id(1, 0).unwrap();
        assert!(superframe.is_random_access_carrier(ra_carrier).unwrap());
        assert_eq!(superframe.ra_channel(ra_carrier).unwrap(), Some(0));
        assert_eq!(superframe.ra_channel(0).unwrap(), None);

        let slots = superframe.ra_slots(0).unwrap();
        assert_eq!(slots.len(), superframe.ra_slot_count(0).unwrap());
        assert!(!slots.is_empty());
        assert_eq!(
            superframe
                .ra_channel_payload_bytes(0, sequence.waveform_conf())
                .unwrap(),
            38
        );
    }
}

#[test]
fn test_slots_fill_target_duration() {
    let sequence = TestScenario::default().sequence().unwrap();
    let superframe = sequence.superframe_conf(0).unwrap();
    let target = sequence.target_duration_s();
    let burst = sequence.waveform_conf().waveform(3).unwrap();

    for frame in superframe.frames() {
        let slot_duration = burst.burst_duration(frame.btu().symbol_rate());
        let per_carrier = frame.time_slot_ids(0).unwrap().len();
        assert!(frame.duration_s() <= target);
        assert!(frame.duration_s() + slot_duration > target);
        assert_eq!(frame.time_slot_count(), per_carrier * frame.carrier_count() as usize);
        assert_close(frame.duration_s(), per_carrier as f64 * slot_duration, 1e-12);
    }
    let allocated = TestScenario::default().config.sequence.allocated_bandwidth_hz;
    assert!(superframe.bandwidth_hz() <= allocated);
}

#[test]
fn test_type3_is_unsupported() {
    let mut scenario = TestScenario::default();
    scenario.config.superframe.config_type = Some(ConfigType::Type3);
    assert!(matches!(
        scenario.sequence(),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn test_bandwidth_budget_exceeded() {
    let mut scenario = TestScenario::default();
    scenario.config.sequence.allocated_bandwidth_hz = 5.0e7;
    assert!(matches!(
        scenario.sequence(),
        Err(Error::Budget(_))
    ));
}
