//! DVB-S2 BBFrame configuration
//!
//! Frame length and payload follow from the MODCOD and the PL framing
//! parameters:
//!
//! ```text
//! slots   = data slots + PL header slots
//! symbols = slots * symbols per slot + floor(slots / pilot interval) * pilot block
//! payload = data slots * symbols per slot * modulated bits * coding rate
//! ```
//!
//! Data slots per frame depend on modulated bits and frame type only.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use satlink_common::{
    db_to_linear, linear_to_db, log_acm_decision, BbFrameConfig, BbFrameType, BbFrameUsageMode,
    Error, LinkDirection, ModCod, Result, DVB_S2_MODCODS,
};
use satlink_link_results::LinkResultsFwd;
use tracing::{debug, warn};

/// Data slots of a frame as (normal, short) for the given modulated bits.
fn data_slots(modulated_bits: u32) -> Result<(u32, u32)> {
    match modulated_bits {
        2 => Ok((360, 90)),
        3 => Ok((240, 60)),
        4 => Ok((180, 45)),
        5 => Ok((144, 36)),
        other => Err(Error::Unsupported(format!(
            "no BBFrame slot table for {other} modulated bits"
        ))),
    }
}

fn check_dvb_s2(modcod: ModCod) -> Result<()> {
    if modcod.is_dvb_s2() {
        Ok(())
    } else {
        Err(Error::Unsupported(format!("{modcod} is not a DVB-S2 MODCOD")))
    }
}

/// One MODCOD in one frame type at the configured symbol rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DvbS2Waveform {
    modcod: ModCod,
    frame_type: BbFrameType,
    frame_duration_s: f64,
    payload_bits: u32,
    cno_requirement: Option<f64>,
}

impl DvbS2Waveform {
    pub fn modcod(&self) -> ModCod {
        self.modcod
    }

    pub fn frame_type(&self) -> BbFrameType {
        self.frame_type
    }

    pub fn frame_duration_s(&self) -> f64 {
        self.frame_duration_s
    }

    pub fn payload_bits(&self) -> u32 {
        self.payload_bits
    }

    /// Payload bits per second.
    pub fn bit_rate(&self) -> f64 {
        self.payload_bits as f64 / self.frame_duration_s
    }

    /// Linear C/N0 (Hz) needed for the target BLER, once initialized.
    pub fn cno_requirement(&self) -> Option<f64> {
        self.cno_requirement
    }
}

impl fmt::Display for DvbS2Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModCod: {}, FrameType: {}, FrameDuration: {:.6e}, Payload: {}, C/No requirement: ",
            self.modcod, self.frame_type, self.frame_duration_s, self.payload_bits
        )?;
        match self.cno_requirement {
            Some(cno) => write!(f, "{:.3}", linear_to_db(cno)),
            None => write!(f, "-"),
        }
    }
}

/// Forward-link BBFrame configuration and MODCOD selection.
#[derive(Debug, Clone)]
pub struct BbFrameConf {
    config: BbFrameConfig,
    symbol_rate: f64,
    short: BTreeMap<ModCod, DvbS2Waveform>,
    normal: BTreeMap<ModCod, DvbS2Waveform>,
}

impl BbFrameConf {
    /// Builds the frame tables of every DVB-S2 MODCOD at `symbol_rate` baud.
    pub fn new(config: &BbFrameConfig, symbol_rate: f64) -> Result<Self> {
        if !(symbol_rate > 0.0 && symbol_rate.is_finite()) {
            return Err(Error::Config(format!("invalid symbol rate {symbol_rate} Bd")));
        }
        if config.symbols_per_slot == 0 || config.pilot_block_interval_in_slots == 0 {
            return Err(Error::Config(
                "slot size and pilot block interval must be positive".to_string(),
            ));
        }
        check_dvb_s2(config.default_modcod)?;

        let mut conf = Self {
            config: config.clone(),
            symbol_rate,
            short: BTreeMap::new(),
            normal: BTreeMap::new(),
        };
        for modcod in DVB_S2_MODCODS {
            for frame_type in [BbFrameType::Short, BbFrameType::Normal] {
                let waveform = DvbS2Waveform {
                    modcod,
                    frame_type,
                    frame_duration_s: conf.bb_frame_length(modcod, frame_type, symbol_rate)?,
                    payload_bits: conf.bb_frame_payload_bits(modcod, frame_type)?,
                    cno_requirement: None,
                };
                match frame_type {
                    BbFrameType::Short => conf.short.insert(modcod, waveform),
                    _ => conf.normal.insert(modcod, waveform),
                };
            }
        }

        let short = conf.most_robust_modcod(BbFrameType::Short)?;
        let normal = conf.most_robust_modcod(BbFrameType::Normal)?;
        if short != normal {
            return Err(Error::Config(format!(
                "most robust MODCOD differs between short ({short}) and normal ({normal}) frames"
            )));
        }

        debug!(
            symbol_rate,
            modcods = DVB_S2_MODCODS.len(),
            usage_mode = ?config.usage_mode,
            "BBFrame configuration built"
        );
        Ok(conf)
    }

    /// Derives the C/N0 requirement of every frame for the target BLER.
    ///
    /// `C/N0 = Es/N0 * symbol rate`.
    pub fn initialize_cno_requirements(&mut self, link_results: &LinkResultsFwd) -> Result<()> {
        let target_bler = self.config.target_bler;
        for waveform in self.short.values_mut().chain(self.normal.values_mut()) {
            let es_no_db = link_results.es_no_db(waveform.modcod, waveform.frame_type, target_bler)?;
            waveform.cno_requirement = Some(db_to_linear(es_no_db) * self.symbol_rate);
        }
        debug!(target_bler, "C/No requirements initialized");
        Ok(())
    }

    /// Symbol rate the frame tables were built for.
    pub fn symbol_rate(&self) -> f64 {
        self.symbol_rate
    }

    /// Bits per symbol of `modcod`.
    pub fn modulated_bits(&self, modcod: ModCod) -> Result<u32> {
        check_dvb_s2(modcod)?;
        Ok(modcod.modulated_bits())
    }

    /// Coding rate of `modcod` as a fraction.
    pub fn coding_rate(&self, modcod: ModCod) -> Result<f64> {
        check_dvb_s2(modcod)?;
        Ok(modcod.coding_rate().value())
    }

    /// Frame duration in seconds. Dummy frames have the dummy frame length
    /// whatever the MODCOD.
    pub fn bb_frame_length(
        &self,
        modcod: ModCod,
        frame_type: BbFrameType,
        symbol_rate: f64,
    ) -> Result<f64> {
        let (normal, short) = data_slots(self.modulated_bits(modcod)?)?;
        let data = match frame_type {
            BbFrameType::Normal => normal,
            BbFrameType::Short => short,
            BbFrameType::Dummy => return Ok(self.dummy_bb_frame_length(symbol_rate)),
        };

        let slots = data + self.config.pl_header_in_slots;
        let data_symbols = slots * self.config.symbols_per_slot;
        let pilot_slots = slots / self.config.pilot_block_interval_in_slots;
        let pilot_symbols = pilot_slots * self.config.pilot_block_in_symbols;
        Ok((data_symbols + pilot_symbols) as f64 / symbol_rate)
    }

    /// Payload bits of one frame, 0 for dummy frames.
    pub fn bb_frame_payload_bits(&self, modcod: ModCod, frame_type: BbFrameType) -> Result<u32> {
        let bits = self.modulated_bits(modcod)?;
        let (normal, short) = data_slots(bits)?;
        let data = match frame_type {
            BbFrameType::Normal => normal,
            BbFrameType::Short => short,
            BbFrameType::Dummy => return Ok(0),
        };
        let rate = modcod.coding_rate();
        Ok(data * self.config.symbols_per_slot * bits * rate.numerator / rate.denominator)
    }

    /// Dummy frame duration in seconds.
    pub fn dummy_bb_frame_length(&self, symbol_rate: f64) -> f64 {
        (self.config.dummy_frame_in_slots * self.config.symbols_per_slot) as f64 / symbol_rate
    }

    /// Precomputed frame of `modcod` and `frame_type`.
    pub fn waveform(&self, modcod: ModCod, frame_type: BbFrameType) -> Result<&DvbS2Waveform> {
        check_dvb_s2(modcod)?;
        self.table(frame_type)?
            .get(&modcod)
            .ok_or_else(|| Error::Unsupported(format!("no {frame_type} for {modcod}")))
    }

    /// Frames of `frame_type` in MODCOD order.
    pub fn waveforms(&self, frame_type: BbFrameType) -> Result<impl Iterator<Item = &DvbS2Waveform>> {
        Ok(self.table(frame_type)?.values())
    }

    /// MODCOD with the highest bit rate whose C/N0 requirement is met by
    /// `cno` (linear, Hz). Equal bit rates go to the lower requirement.
    ///
    /// Falls back to the default MODCOD when ACM is disabled, `cno` is NaN or
    /// no MODCOD qualifies.
    pub fn best_modcod(&self, cno: f64, frame_type: BbFrameType) -> Result<ModCod> {
        let table = self.table(frame_type)?;
        if !self.config.acm_enabled {
            return Ok(self.config.default_modcod);
        }
        if cno.is_nan() {
            warn!(default = %self.config.default_modcod, "No C/No estimate, using default MODCOD");
            return Ok(self.config.default_modcod);
        }

        let mut best: Option<(&DvbS2Waveform, f64)> = None;
        for waveform in table.values() {
            let required = waveform.cno_requirement.ok_or(Error::NotInitialized)?;
            if required > cno {
                continue;
            }
            best = match best {
                Some((current, current_required))
                    if current.bit_rate() > waveform.bit_rate()
                        || (current.bit_rate() == waveform.bit_rate()
                            && current_required <= required) =>
                {
                    Some((current, current_required))
                }
                _ => Some((waveform, required)),
            };
        }

        let selected = best.map(|(waveform, _)| waveform.modcod);
        log_acm_decision(
            LinkDirection::Forward,
            linear_to_db(cno),
            selected.as_ref().map(|m| m as &dyn fmt::Display),
        );
        Ok(selected.unwrap_or_else(|| {
            warn!(
                cno_db = linear_to_db(cno),
                default = %self.config.default_modcod,
                "No MODCOD meets the C/No, using default"
            );
            self.config.default_modcod
        }))
    }

    /// MODCOD with the smallest payload in `frame_type` frames.
    pub fn most_robust_modcod(&self, frame_type: BbFrameType) -> Result<ModCod> {
        self.table(frame_type)?
            .values()
            .min_by_key(|waveform| waveform.payload_bits)
            .map(|waveform| waveform.modcod)
            .ok_or_else(|| Error::Config("BBFrame table is empty".to_string()))
    }

    pub fn default_modcod(&self) -> ModCod {
        self.config.default_modcod
    }

    pub fn acm_enabled(&self) -> bool {
        self.config.acm_enabled
    }

    pub fn target_bler(&self) -> f64 {
        self.config.target_bler
    }

    pub fn bb_frame_header_in_bytes(&self) -> u32 {
        self.config.bb_frame_header_in_bytes
    }

    pub fn high_occupancy_threshold(&self) -> f64 {
        self.config.high_occupancy_threshold
    }

    pub fn low_occupancy_threshold(&self) -> f64 {
        self.config.low_occupancy_threshold
    }

    pub fn usage_mode(&self) -> BbFrameUsageMode {
        self.config.usage_mode
    }

    /// Frame types the usage mode allows.
    pub fn frame_types(&self) -> &'static [BbFrameType] {
        match self.config.usage_mode {
            BbFrameUsageMode::ShortFrames => &[BbFrameType::Short],
            BbFrameUsageMode::NormalFrames => &[BbFrameType::Normal],
            BbFrameUsageMode::ShortAndNormalFrames => &[BbFrameType::Short, BbFrameType::Normal],
        }
    }

    /// Describes every frame of the types in use, plus the dummy frame.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for &frame_type in self.frame_types() {
            if let Ok(table) = self.table(frame_type) {
                for waveform in table.values() {
                    let _ = writeln!(out, "{waveform}");
                }
            }
        }
        let _ = writeln!(
            out,
            "FrameType: {}, FrameDuration: {:.6e}",
            BbFrameType::Dummy,
            self.dummy_bb_frame_length(self.symbol_rate)
        );
        out
    }

    fn table(&self, frame_type: BbFrameType) -> Result<&BTreeMap<ModCod, DvbS2Waveform>> {
        match frame_type {
            BbFrameType::Short => Ok(&self.short),
            BbFrameType::Normal => Ok(&self.normal),
            BbFrameType::Dummy => Err(Error::Unsupported(
                "dummy frames carry no MODCOD".to_string(),
            )),
        }
    }
}
