//! Test fixtures and configuration helpers
//!
//! Provides the reference data locations and pre-configured scenarios.

use std::path::PathBuf;

use satlink_common::{DataPaths, Result, SatConfig, SuperframePreset};
use satlink_fwd::BbFrameConf;
use satlink_link_results::{LinkResults, LinkResultsFwd, LinkResultsRtn};
use satlink_rtn::{SuperframeSequence, WaveformConf};

/// Reference data directory of the workspace
pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data")
}

/// Reference DVB-RCS2 waveform table directory
pub fn waveform_dir() -> PathBuf {
    data_dir().join("waveforms/dvb-rcs2")
}

/// Reference BLER curve directory
pub fn link_results_dir() -> PathBuf {
    data_dir().join("linkresults")
}

/// Test scenario over the reference data
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub config: SatConfig,
}

impl Default for TestScenario {
    fn default() -> Self {
        let config = SatConfig {
            data: DataPaths {
                waveform_dir: waveform_dir(),
                link_results_dir: link_results_dir(),
            },
            ..SatConfig::default()
        };
        Self { config }
    }
}

impl TestScenario {
    /// Enable or disable ACM on both links
    pub fn with_acm(mut self, enabled: bool) -> Self {
        self.config.waveform.acm_enabled = enabled;
        self.config.bb_frame.acm_enabled = enabled;
        self
    }

    /// Use a different superframe preset
    pub fn with_preset(mut self, preset: SuperframePreset) -> Self {
        self.config.superframe = satlink_common::SuperframeConfig::from_preset(preset);
        self
    }

    /// Return-link link results for the reference waveform ids
    pub fn link_results_rtn(&self) -> Result<LinkResultsRtn> {
        let mut results = LinkResultsRtn::dvb_rcs2(&self.config.data.link_results_dir, 3..=22);
        results.initialize()?;
        Ok(results)
    }

    /// Forward-link link results
    pub fn link_results_fwd(&self) -> Result<LinkResultsFwd> {
        let mut results =
            LinkResultsFwd::dvb_s2(&self.config.data.link_results_dir, &self.config.link_results);
        results.initialize()?;
        Ok(results)
    }

    /// Reference waveform table with Eb/N0 requirements
    pub fn waveform_conf(&self) -> Result<WaveformConf> {
        let mut conf =
            WaveformConf::from_directory(&self.config.data.waveform_dir, &self.config.waveform)?;
        conf.initialize_eb_no_requirements(&self.link_results_rtn()?)?;
        Ok(conf)
    }

    /// BBFrame configuration with C/N0 requirements
    pub fn bb_frame_conf(&self, symbol_rate: f64) -> Result<BbFrameConf> {
        let mut conf = BbFrameConf::new(&self.config.bb_frame, symbol_rate)?;
        conf.initialize_cno_requirements(&self.link_results_fwd()?)?;
        Ok(conf)
    }

    /// Superframe sequence of the configured preset
    pub fn sequence(&self) -> Result<SuperframeSequence> {
        SuperframeSequence::build(
            &self.config.superframe,
            &self.config.sequence,
            self.waveform_conf()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_data_present() {
        assert!(waveform_dir().join("waveforms.txt").is_file());
        assert!(waveform_dir().join("default_waveform.txt").is_file());
        assert!(link_results_dir().join("rcs2_waveformat3.txt").is_file());
        assert!(link_results_dir().join("s2_qpsk_1_to_2.txt").is_file());
    }

    #[test]
    fn test_scenario_defaults() {
        let scenario = TestScenario::default().with_acm(true);
        assert!(scenario.config.waveform.acm_enabled);
        assert!(scenario.config.bb_frame.acm_enabled);
        assert_eq!(scenario.config.superframe.preset, SuperframePreset::Config0);
    }
}
