//! Configuration structures for the satellite link layer
//!
//! One YAML document configures the return-link superframe, the waveform
//! table, the forward-link BBFrame parameters and the reference-data paths.
//! Every section has defaults, so a partial file (or an empty one) is valid.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BurstLength, ModCod};

/// Frame configuration algorithm used by `Superframe::configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    /// Equal frames, default waveform in every slot
    Type0,
    /// Same algorithm as `Type0`
    Type1,
    /// Same algorithm as `Type0`
    Type2,
    /// Reserved, not implemented
    Type3,
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            ConfigType::Type0 => 0,
            ConfigType::Type1 => 1,
            ConfigType::Type2 => 2,
            ConfigType::Type3 => 3,
        };
        write!(f, "config type {n}")
    }
}

/// Attributes of one frame of a superframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameAttributes {
    /// Bandwidth allocated to the whole frame (Hz)
    pub allocated_bandwidth_hz: f64,
    /// Bandwidth allocated to one carrier of the frame (Hz)
    pub carrier_allocated_bandwidth_hz: f64,
    /// Carrier roll-off factor, `[0, 1)`
    pub carrier_roll_off: f64,
    /// Carrier spacing factor, `[0, 1)`
    pub carrier_spacing: f64,
    /// Frame is used for random access
    #[serde(default)]
    pub random_access: bool,
}

impl FrameAttributes {
    const fn new(
        allocated_bandwidth_hz: f64,
        carrier_allocated_bandwidth_hz: f64,
        random_access: bool,
    ) -> Self {
        Self {
            allocated_bandwidth_hz,
            carrier_allocated_bandwidth_hz,
            carrier_roll_off: 0.20,
            carrier_spacing: 0.30,
            random_access,
        }
    }
}

/// Named superframe layouts.
///
/// All presets have ten frames with frame 1 reserved for random access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperframePreset {
    /// 12.5 MHz frames of 1.25 MHz carriers
    #[default]
    Config0,
    /// 1.25 MHz frames of 125 kHz carriers
    Config1,
    /// As `Config1`, configuration type 2
    Config2,
    /// As `Config1`, configuration type 2
    Config3,
}

impl SuperframePreset {
    /// Number of frames in the preset
    pub const FRAME_COUNT: usize = 10;

    /// Configuration type of the preset.
    pub fn config_type(&self) -> ConfigType {
        match self {
            SuperframePreset::Config0 => ConfigType::Type0,
            SuperframePreset::Config1 => ConfigType::Type1,
            SuperframePreset::Config2 | SuperframePreset::Config3 => ConfigType::Type2,
        }
    }

    /// Default attributes of frame `index`.
    pub fn frame(&self, index: usize) -> Result<FrameAttributes> {
        if index >= Self::FRAME_COUNT {
            return Err(Error::out_of_range(
                "frame",
                index as u64,
                Self::FRAME_COUNT as u64,
            ));
        }
        let random_access = index == 1;
        let attrs = match (self, random_access) {
            (_, true) => FrameAttributes::new(1.25e6, 1.25e6, true),
            (SuperframePreset::Config0, false) => FrameAttributes::new(1.25e7, 1.25e6, false),
            (_, false) => FrameAttributes::new(1.25e6, 1.25e5, false),
        };
        Ok(attrs)
    }
}

/// Return-link superframe configuration.
///
/// `frame_count`, `config_type` and the leading entries of `frames` override
/// the preset. Frames not listed keep their preset attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperframeConfig {
    /// Layout the defaults come from
    pub preset: SuperframePreset,
    /// Number of frames to configure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<usize>,
    /// Configuration algorithm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_type: Option<ConfigType>,
    /// Per-frame attribute overrides, indexed from frame 0
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FrameAttributes>,
}

impl SuperframeConfig {
    /// Creates a configuration that uses `preset` unchanged.
    pub fn from_preset(preset: SuperframePreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Number of frames to configure.
    pub fn frame_count(&self) -> usize {
        self.frame_count.unwrap_or(SuperframePreset::FRAME_COUNT)
    }

    /// Configuration algorithm in effect.
    pub fn config_type(&self) -> ConfigType {
        self.config_type.unwrap_or_else(|| self.preset.config_type())
    }

    /// Attributes of frame `index`, which must be below `frame_count()`.
    pub fn frame(&self, index: usize) -> Result<FrameAttributes> {
        let count = self.frame_count();
        if index >= count {
            return Err(Error::out_of_range("frame", index as u64, count as u64));
        }
        match self.frames.get(index) {
            Some(attrs) => Ok(*attrs),
            None => self.preset.frame(index),
        }
    }
}

/// Return-link waveform (ACM) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Select waveforms by estimated C/N0
    pub acm_enabled: bool,
    /// Block error rate the Eb/N0 requirements are derived for
    pub target_bler: f64,
    /// Burst lengths in use
    pub burst_length: BurstLength,
    /// Overrides the id read from `default_waveform.txt`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_waveform_id: Option<u32>,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            acm_enabled: false,
            target_bler: 1e-5,
            burst_length: BurstLength::ShortAndLong,
            default_waveform_id: None,
        }
    }
}

/// Which BBFrame types the forward link uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BbFrameUsageMode {
    /// Short frames only
    ShortFrames,
    /// Normal frames only
    #[default]
    NormalFrames,
    /// Short and normal frames
    ShortAndNormalFrames,
}

/// Forward-link BBFrame configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BbFrameConfig {
    /// Symbols in one PL slot
    pub symbols_per_slot: u32,
    /// Symbols in one pilot block
    pub pilot_block_in_symbols: u32,
    /// Slots between two pilot blocks
    pub pilot_block_interval_in_slots: u32,
    /// PL header length in slots
    pub pl_header_in_slots: u32,
    /// Dummy frame length in slots
    pub dummy_frame_in_slots: u32,
    /// BBFrame header size in bytes
    pub bb_frame_header_in_bytes: u32,
    /// Occupancy above which a frame counts as highly occupied
    pub high_occupancy_threshold: f64,
    /// Occupancy below which a frame counts as lowly occupied
    pub low_occupancy_threshold: f64,
    /// Block error rate the Es/N0 requirements are derived for
    pub target_bler: f64,
    /// Select MODCODs by estimated C/N0
    pub acm_enabled: bool,
    /// MODCOD used when ACM is disabled or no MODCOD qualifies
    pub default_modcod: ModCod,
    /// Frame types in use
    pub usage_mode: BbFrameUsageMode,
}

impl Default for BbFrameConfig {
    fn default() -> Self {
        Self {
            symbols_per_slot: 90,
            pilot_block_in_symbols: 36,
            pilot_block_interval_in_slots: 16,
            pl_header_in_slots: 1,
            dummy_frame_in_slots: 36,
            bb_frame_header_in_bytes: 10,
            high_occupancy_threshold: 0.9,
            low_occupancy_threshold: 0.5,
            target_bler: 1e-5,
            acm_enabled: false,
            default_modcod: ModCod::Qpsk1_2,
            usage_mode: BbFrameUsageMode::NormalFrames,
        }
    }
}

/// Link results configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkResultsConfig {
    /// Extra Es/N0 short frames need compared to normal frames (dB)
    pub short_frame_es_no_offset_db: f64,
}

impl Default for LinkResultsConfig {
    fn default() -> Self {
        Self {
            short_frame_es_no_offset_db: 0.4,
        }
    }
}

/// Superframe sequence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Target superframe duration in milliseconds
    pub target_duration_ms: u64,
    /// Minimum time sent TBTPs are kept, in milliseconds
    pub tbtp_store_time_ms: u64,
    /// Return-link bandwidth available to one superframe (Hz)
    pub allocated_bandwidth_hz: f64,
}

impl SequenceConfig {
    /// Target superframe duration in seconds.
    pub fn target_duration_s(&self) -> f64 {
        self.target_duration_ms as f64 / 1000.0
    }

    /// TBTP retention time in seconds.
    pub fn tbtp_store_time_s(&self) -> f64 {
        self.tbtp_store_time_ms as f64 / 1000.0
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            target_duration_ms: 100,
            tbtp_store_time_ms: 300,
            allocated_bandwidth_hz: 1.25e8,
        }
    }
}

/// Locations of the reference data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Directory holding `waveforms.txt` and `default_waveform.txt`
    pub waveform_dir: PathBuf,
    /// Directory holding the BLER curves
    pub link_results_dir: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            waveform_dir: PathBuf::from("data/waveforms/dvb-rcs2"),
            link_results_dir: PathBuf::from("data/linkresults"),
        }
    }
}

impl DataPaths {
    /// Resolves relative paths against `base`.
    pub fn relative_to(&self, base: &Path) -> Self {
        Self {
            waveform_dir: base.join(&self.waveform_dir),
            link_results_dir: base.join(&self.link_results_dir),
        }
    }
}

/// Complete satellite link configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatConfig {
    /// Return-link superframe layout
    pub superframe: SuperframeConfig,
    /// Superframe sequence and TBTP history
    pub sequence: SequenceConfig,
    /// Return-link waveforms
    pub waveform: WaveformConfig,
    /// Forward-link BBFrames
    pub bb_frame: BbFrameConfig,
    /// Link results
    pub link_results: LinkResultsConfig,
    /// Reference data locations
    pub data: DataPaths,
}

impl SatConfig {
    /// Parses a configuration from a YAML string.
    ///
    /// # Example
    /// ```
    /// use satlink_common::SatConfig;
    ///
    /// let yaml = r#"
    /// waveform:
    ///   acm_enabled: true
    /// superframe:
    ///   preset: config1
    /// "#;
    ///
    /// let config = SatConfig::from_yaml(yaml).unwrap();
    /// assert!(config.waveform.acm_enabled);
    /// assert_eq!(config.sequence.target_duration_ms, 100);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
