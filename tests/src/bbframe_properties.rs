//! Forward-link BBFrame integration tests
//!
//! Framing properties over every DVB-S2 MODCOD and ACM selection with the
//! reference link results.

use integration_tests::{assert_close, init_test_logging, TestScenario};
use satlink_common::{
    db_to_linear, linear_to_db, BbFrameConfig, BbFrameType, ModCod, DVB_S2_MODCODS,
};
use satlink_fwd::BbFrameConf;

const SYMBOL_RATE: f64 = 10_000_000.0;

const DVB_S2_RATES: [(u32, u32); 8] = [
    (1, 2),
    (2, 3),
    (3, 4),
    (3, 5),
    (4, 5),
    (5, 6),
    (8, 9),
    (9, 10),
];

fn conf() -> BbFrameConf {
    BbFrameConf::new(&BbFrameConfig::default(), SYMBOL_RATE).expect("Invalid BBFrame config")
}

#[test]
fn test_every_modcod_is_mapped() {
    let conf = conf();
    for modcod in DVB_S2_MODCODS {
        let bits = conf.modulated_bits(modcod).unwrap();
        assert!((2..=5).contains(&bits), "{modcod}: {bits} bits");

        let rate = modcod.coding_rate();
        assert!(
            DVB_S2_RATES.contains(&(rate.numerator, rate.denominator)),
            "{modcod}: rate {rate}"
        );
        assert_close(conf.coding_rate(modcod).unwrap(), rate.value(), 0.0);
    }
}

#[test]
fn test_payload_grows_with_coding_rate() {
    let conf = conf();
    for frame_type in [BbFrameType::Short, BbFrameType::Normal] {
        for bits in 2..=5 {
            let mut modcods: Vec<ModCod> = DVB_S2_MODCODS
                .iter()
                .copied()
                .filter(|m| m.modulated_bits() == bits)
                .collect();
            modcods.sort_by(|a, b| a.coding_rate().value().total_cmp(&b.coding_rate().value()));

            let payloads: Vec<u32> = modcods
                .iter()
                .map(|&m| conf.bb_frame_payload_bits(m, frame_type).unwrap())
                .collect();
            assert!(payloads.windows(2).all(|w| w[0] <= w[1]), "{payloads:?}");
        }
    }
}

#[test]
fn test_fec_frame_sizes() {
    // Payload over the code rate is the FECFRAME size
    let conf = conf();
    for modcod in DVB_S2_MODCODS {
        let rate = modcod.coding_rate().value();
        let normal = conf.bb_frame_payload_bits(modcod, BbFrameType::Normal).unwrap();
        let short = conf.bb_frame_payload_bits(modcod, BbFrameType::Short).unwrap();
        assert_close(normal as f64 / rate, 64_800.0, 1e-6);
        assert_close(short as f64 / rate, 16_200.0, 1e-6);
    }
}

#[test]
fn test_short_frame_symbol_count() {
    let conf = conf();
    let length = conf
        .bb_frame_length(ModCod::Qpsk1_2, BbFrameType::Short, SYMBOL_RATE)
        .unwrap();
    assert_close(length * SYMBOL_RATE, 8370.0, 1e-6);
    assert_close(conf.dummy_bb_frame_length(SYMBOL_RATE) * SYMBOL_RATE, 3240.0, 1e-6);
}

#[test]
fn test_reference_cno_requirements() {
    init_test_logging();

    let scenario = TestScenario::default().with_acm(true);
    let conf = scenario
        .bb_frame_conf(SYMBOL_RATE)
        .expect("Failed to initialize BBFrame configuration");
    let offset = scenario.config.link_results.short_frame_es_no_offset_db;

    for modcod in DVB_S2_MODCODS {
        let normal = conf.waveform(modcod, BbFrameType::Normal).unwrap();
        let short = conf.waveform(modcod, BbFrameType::Short).unwrap();
        let normal_db = linear_to_db(normal.cno_requirement().unwrap());
        let short_db = linear_to_db(short.cno_requirement().unwrap());
        assert_close(short_db - normal_db, offset, 1e-9);
    }
}

#[test]
fn test_acm_bit_rate_never_drops() {
    init_test_logging();

    let conf = TestScenario::default()
        .with_acm(true)
        .bb_frame_conf(SYMBOL_RATE)
        .unwrap();

    for frame_type in [BbFrameType::Short, BbFrameType::Normal] {
        let mut last_rate = 0.0;
        for step in 0..120 {
            let cno = db_to_linear(60.0 + 0.25 * step as f64);
            let modcod = conf.best_modcod(cno, frame_type).unwrap();
            let waveform = conf.waveform(modcod, frame_type).unwrap();
            let rate = waveform.bit_rate();
            assert!(rate >= last_rate, "{modcod} at step {step}");
            if modcod != conf.default_modcod() {
                assert!(waveform.cno_requirement().unwrap() <= cno);
            }
            last_rate = rate;
        }
    }
}

#[test]
fn test_acm_extremes() {
    let conf = TestScenario::default()
        .with_acm(true)
        .bb_frame_conf(SYMBOL_RATE)
        .unwrap();

    assert_eq!(
        conf.best_modcod(0.0, BbFrameType::Normal).unwrap(),
        conf.default_modcod()
    );
    assert_eq!(
        conf.best_modcod(f64::INFINITY, BbFrameType::Normal).unwrap(),
        ModCod::Apsk32_8_9
    );
    assert_eq!(
        conf.most_robust_modcod(BbFrameType::Short).unwrap(),
        ModCod::Qpsk1_2
    );
}
