//! Building the link configuration from a YAML file and the reference data

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use satlink_common::{DataPaths, SatConfig};
use satlink_fwd::BbFrameConf;
use satlink_link_results::{LinkResults, LinkResultsFwd, LinkResultsRtn};
use satlink_rtn::{SuperframeSequence, WaveformConf};
use tracing::info;

/// Configuration plus the resolved data directories.
pub struct Scenario {
    pub config: SatConfig,
    pub data: DataPaths,
}

impl Scenario {
    /// Loads `path`, or the defaults when no file is given. Relative data
    /// paths resolve against the file's directory, or the working directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config, base) = match path {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                let config = SatConfig::from_yaml_file(path)
                    .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (config, base)
            }
            None => (SatConfig::default(), PathBuf::new()),
        };
        let data = config.data.relative_to(&base);
        Ok(Self { config, data })
    }

    /// Waveform table with Eb/N0 requirements from the DVB-RCS2 link results.
    pub fn waveform_conf(&self) -> Result<WaveformConf> {
        let mut conf = WaveformConf::from_directory(&self.data.waveform_dir, &self.config.waveform)
            .context("Failed to load waveform table")?;
        let mut link_results = LinkResultsRtn::dvb_rcs2(
            &self.data.link_results_dir,
            conf.iter().map(|wf| wf.id()),
        );
        link_results
            .initialize()
            .context("Failed to load DVB-RCS2 link results")?;
        conf.initialize_eb_no_requirements(&link_results)?;
        Ok(conf)
    }

    /// BBFrame configuration with C/N0 requirements from the DVB-S2 link results.
    pub fn bb_frame_conf(&self, symbol_rate: f64) -> Result<BbFrameConf> {
        let mut conf = BbFrameConf::new(&self.config.bb_frame, symbol_rate)
            .context("Invalid BBFrame configuration")?;
        let mut link_results =
            LinkResultsFwd::dvb_s2(&self.data.link_results_dir, &self.config.link_results);
        link_results
            .initialize()
            .context("Failed to load DVB-S2 link results")?;
        conf.initialize_cno_requirements(&link_results)?;
        Ok(conf)
    }

    /// Superframe sequence of the configured superframe.
    pub fn sequence(&self) -> Result<SuperframeSequence> {
        let waveform_conf = self.waveform_conf()?;
        SuperframeSequence::build(&self.config.superframe, &self.config.sequence, waveform_conf)
            .context("Failed to configure superframe")
    }
}
