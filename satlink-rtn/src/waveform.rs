//! DVB-RCS2 waveform table and return-link ACM
//!
//! A waveform is one row of `waveforms.txt`:
//!
//! ```text
//! id modulatedBits codingRate payloadBytes burstLengthSymbols [preambleSymbols]
//! 3  2             1/3        38           536
//! ```
//!
//! Ids must be contiguous and, within one burst length, payload must grow
//! with the id. The best-waveform search walks ids downwards and stops at
//! the first waveform whose C/N0 threshold is met, which under that
//! ordering is the most efficient one the link can carry.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use satlink_common::{
    db_to_linear, linear_to_db, log_acm_decision, log_table_loaded, BurstLength, CodingRate,
    Error, LinkDirection, ModCod, Result, WaveformConfig, BITS_PER_BYTE,
};
use satlink_link_results::LinkResultsRtn;
use tracing::{debug, info, warn};

/// Waveform used when neither the configuration nor `default_waveform.txt` names one
pub const DEFAULT_WAVEFORM_ID: u32 = 3;

/// One DVB-RCS2 burst format.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    id: u32,
    modulated_bits: u32,
    coding_rate: CodingRate,
    modcod: ModCod,
    payload_bytes: u32,
    length_in_symbols: u32,
    preamble_length_in_symbols: u32,
    eb_no_requirement: Option<f64>,
}

impl Waveform {
    /// Creates a waveform. The MODCOD is derived from modulation and rate.
    pub fn new(
        id: u32,
        modulated_bits: u32,
        coding_rate: CodingRate,
        payload_bytes: u32,
        length_in_symbols: u32,
        preamble_length_in_symbols: u32,
    ) -> Result<Self> {
        if length_in_symbols == 0 {
            return Err(Error::Config(format!(
                "waveform {id} has a zero burst length"
            )));
        }
        Ok(Self {
            id,
            modulated_bits,
            coding_rate,
            modcod: ModCod::from_rcs2(modulated_bits, coding_rate)?,
            payload_bytes,
            length_in_symbols,
            preamble_length_in_symbols,
            eb_no_requirement: None,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn modulated_bits(&self) -> u32 {
        self.modulated_bits
    }

    pub fn coding_rate(&self) -> CodingRate {
        self.coding_rate
    }

    pub fn modcod(&self) -> ModCod {
        self.modcod
    }

    pub fn payload_bytes(&self) -> u32 {
        self.payload_bytes
    }

    pub fn burst_length_in_symbols(&self) -> u32 {
        self.length_in_symbols
    }

    pub fn preamble_length_in_symbols(&self) -> u32 {
        self.preamble_length_in_symbols
    }

    /// Burst duration in seconds at `symbol_rate` baud.
    pub fn burst_duration(&self, symbol_rate: f64) -> f64 {
        self.length_in_symbols as f64 / symbol_rate
    }

    /// Preamble duration in seconds at `symbol_rate` baud.
    pub fn preamble_duration(&self, symbol_rate: f64) -> f64 {
        self.preamble_length_in_symbols as f64 / symbol_rate
    }

    /// Payload bits per second while the burst is on air.
    pub fn throughput_bps(&self, symbol_rate: f64) -> f64 {
        (BITS_PER_BYTE * self.payload_bytes) as f64 / self.burst_duration(symbol_rate)
    }

    /// Throughput per Hz of carrier bandwidth.
    pub fn spectral_efficiency(&self, carrier_bandwidth_hz: f64, symbol_rate: f64) -> f64 {
        self.throughput_bps(symbol_rate) / carrier_bandwidth_hz
    }

    /// Linear Eb/N0 needed for the target BLER, once initialized.
    pub fn eb_no_requirement(&self) -> Option<f64> {
        self.eb_no_requirement
    }

    /// Stores the linear Eb/N0 requirement.
    pub fn set_eb_no_requirement(&mut self, eb_no: f64) {
        self.eb_no_requirement = Some(eb_no);
    }

    /// Linear C/N0 (Hz) the waveform needs at `symbol_rate` baud.
    ///
    /// `C/N0 = Eb/N0 * Rs * log2(modulatedBits)`.
    pub fn cno_threshold(&self, symbol_rate: f64) -> Result<f64> {
        let eb_no = self.eb_no_requirement.ok_or(Error::NotInitialized)?;
        Ok(eb_no * symbol_rate * (self.modulated_bits as f64).log2())
    }

    /// One-line description at the given carrier bandwidth and symbol rate.
    pub fn dump(&self, carrier_bandwidth_hz: f64, symbol_rate: f64) -> String {
        let requirement = |value: Option<f64>| match value {
            Some(v) => format!("{:.3}", linear_to_db(v)),
            None => "-".to_string(),
        };
        format!(
            "WaveformId: {} ModCod: {}, Payload: {}, BurstLength: {}, EbNoRequirement: {}, \
             BurstDuration: {:.6e}, Throughput: {:.1}, SpectralEfficiency: {:.4}, C/No threshold: {}",
            self.id,
            self.modcod,
            self.payload_bytes,
            self.length_in_symbols,
            requirement(self.eb_no_requirement),
            self.burst_duration(symbol_rate),
            self.throughput_bps(symbol_rate),
            self.spectral_efficiency(carrier_bandwidth_hz, symbol_rate),
            requirement(self.cno_threshold(symbol_rate).ok()),
        )
    }
}

/// Waveform table with the return-link ACM settings.
#[derive(Debug, Clone)]
pub struct WaveformConf {
    waveforms: BTreeMap<u32, Waveform>,
    min_id: u32,
    max_id: u32,
    default_id: u32,
    target_bler: f64,
    acm_enabled: bool,
    burst_length: BurstLength,
}

impl WaveformConf {
    /// Builds the table from waveforms already parsed.
    pub fn new(waveforms: Vec<Waveform>, default_id: u32, config: &WaveformConfig) -> Result<Self> {
        Self::build(waveforms, default_id, config, Path::new("<memory>"))
    }

    /// Reads `<dir>/waveforms.txt` and `<dir>/default_waveform.txt`.
    ///
    /// `config.default_waveform_id` takes precedence over the default file.
    pub fn from_directory<P: AsRef<Path>>(dir: P, config: &WaveformConfig) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::load(dir, "no such directory"));
        }

        let table_path = dir.join("waveforms.txt");
        let waveforms = read_waveforms(&table_path)?;
        let default_id = match config.default_waveform_id {
            Some(id) => id,
            None => read_default_waveform(&dir.join("default_waveform.txt"))?,
        };
        Self::build(waveforms, default_id, config, &table_path)
    }

    /// Reads a waveform table file. The default id comes from the
    /// configuration, or [`DEFAULT_WAVEFORM_ID`].
    pub fn from_file<P: AsRef<Path>>(path: P, config: &WaveformConfig) -> Result<Self> {
        let path = path.as_ref();
        let waveforms = read_waveforms(path)?;
        let default_id = config.default_waveform_id.unwrap_or(DEFAULT_WAVEFORM_ID);
        Self::build(waveforms, default_id, config, path)
    }

    fn build(
        waveforms: Vec<Waveform>,
        default_id: u32,
        config: &WaveformConfig,
        source: &Path,
    ) -> Result<Self> {
        let mut table = BTreeMap::new();
        for wf in waveforms {
            let id = wf.id;
            if table.insert(id, wf).is_some() {
                return Err(Error::load(source, format!("duplicate waveform id {id}")));
            }
        }

        let (min_id, max_id) = match (table.keys().next(), table.keys().next_back()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => return Err(Error::load(source, "waveform table is empty")),
        };
        if u64::from(max_id) - u64::from(min_id) + 1 != table.len() as u64 {
            return Err(Error::load(
                source,
                format!("waveform ids {min_id}..={max_id} are not contiguous"),
            ));
        }

        // Descending-id search relies on payload growing with id per burst length
        let mut last_payload: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
        for wf in table.values() {
            if let Some(&(prev_id, prev_payload)) = last_payload.get(&wf.length_in_symbols) {
                if wf.payload_bytes <= prev_payload {
                    return Err(Error::load(
                        source,
                        format!(
                            "waveform {} ({} bytes) is not more efficient than waveform {} ({} bytes)",
                            wf.id, wf.payload_bytes, prev_id, prev_payload
                        ),
                    ));
                }
            }
            last_payload.insert(wf.length_in_symbols, (wf.id, wf.payload_bytes));
        }

        if !table.contains_key(&default_id) {
            return Err(Error::out_of_range("default waveform", default_id, max_id + 1));
        }

        log_table_loaded(LinkDirection::Return, "waveform", source, table.len());

        Ok(Self {
            waveforms: table,
            min_id,
            max_id,
            default_id,
            target_bler: config.target_bler,
            acm_enabled: config.acm_enabled,
            burst_length: config.burst_length,
        })
    }

    /// Derives every waveform's Eb/N0 requirement for the target BLER.
    pub fn initialize_eb_no_requirements(&mut self, link_results: &LinkResultsRtn) -> Result<()> {
        for (id, wf) in self.waveforms.iter_mut() {
            let eb_no_db = link_results.eb_no_db(*id, self.target_bler)?;
            wf.set_eb_no_requirement(db_to_linear(eb_no_db));
        }
        debug!(
            waveforms = self.waveforms.len(),
            target_bler = self.target_bler,
            "Eb/No requirements initialized"
        );
        Ok(())
    }

    /// Waveform `id`.
    pub fn waveform(&self, id: u32) -> Result<&Waveform> {
        if id < self.min_id || id > self.max_id {
            return Err(Error::Unsupported(format!("unsupported waveform id {id}")));
        }
        self.waveforms
            .get(&id)
            .ok_or_else(|| Error::Unsupported(format!("unsupported waveform id {id}")))
    }

    /// Waveforms in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Waveform> {
        self.waveforms.values()
    }

    /// Lowest and highest waveform id.
    pub fn id_range(&self) -> (u32, u32) {
        (self.min_id, self.max_id)
    }

    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    pub fn default_waveform_id(&self) -> u32 {
        self.default_id
    }

    pub fn acm_enabled(&self) -> bool {
        self.acm_enabled
    }

    pub fn target_bler(&self) -> f64 {
        self.target_bler
    }

    /// MODCOD of waveform `id`.
    pub fn modcod(&self, id: u32) -> Result<ModCod> {
        Ok(self.waveform(id)?.modcod)
    }

    /// Burst lengths in use, in symbols.
    pub fn supported_burst_lengths(&self) -> &'static [u32] {
        self.burst_length.supported_lengths()
    }

    /// Shortest burst length in use, in symbols.
    pub fn default_burst_length(&self) -> u32 {
        self.supported_burst_lengths()[0]
    }

    /// Most efficient waveform of `burst_length` symbols whose C/N0 threshold
    /// at `symbol_rate` is at most `cno` (linear, Hz).
    ///
    /// With ACM disabled, or for a NaN `cno`, this is the default waveform.
    /// `Ok(None)` means no waveform of that burst length closes the link.
    pub fn best_waveform_id(&self, cno: f64, symbol_rate: f64, burst_length: u32) -> Result<Option<u32>> {
        if !self.acm_enabled {
            return Ok(Some(self.default_id));
        }
        if cno.is_nan() {
            warn!(default = self.default_id, "No C/No estimate, using default waveform");
            return Ok(Some(self.default_id));
        }

        let mut selected = None;
        for wf in self.waveforms.values().rev() {
            if wf.length_in_symbols != burst_length {
                continue;
            }
            if wf.cno_threshold(symbol_rate)? <= cno {
                selected = Some(wf.id);
                break;
            }
        }

        log_acm_decision(
            LinkDirection::Return,
            linear_to_db(cno),
            selected.as_ref().map(|id| id as &dyn fmt::Display),
        );
        Ok(selected)
    }

    /// Waveform of `burst_length` symbols with the smallest payload.
    pub fn most_robust_waveform_id(&self, burst_length: u32) -> Option<u32> {
        self.waveforms
            .values()
            .filter(|wf| wf.length_in_symbols == burst_length)
            .min_by_key(|wf| wf.payload_bytes)
            .map(|wf| wf.id)
    }

    /// Describes every waveform at the given carrier bandwidth and symbol rate.
    pub fn dump(&self, carrier_bandwidth_hz: f64, symbol_rate: f64) -> String {
        let mut out = String::new();
        for wf in self.waveforms.values() {
            let _ = writeln!(out, "{}", wf.dump(carrier_bandwidth_hz, symbol_rate));
        }
        out
    }

    pub(crate) fn log_summary(&self) {
        info!(
            waveforms = self.waveforms.len(),
            default = self.default_id,
            acm = self.acm_enabled,
            "Waveform table ready"
        );
    }
}

/// Parses a waveform table file.
pub fn read_waveforms(path: &Path) -> Result<Vec<Waveform>> {
    let contents = fs::read_to_string(path)?;
    parse_waveforms(&contents).map_err(|err| match err {
        Error::Config(reason) | Error::Unsupported(reason) => Error::load(path, reason),
        other => other,
    })
}

/// Parses the rows of a waveform table.
pub fn parse_waveforms(contents: &str) -> Result<Vec<Waveform>> {
    let mut waveforms = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 5 || fields.len() > 6 {
            return Err(Error::Config(format!(
                "line {}: waveform row has unexpected amount of elements ({})",
                line_no + 1,
                fields.len()
            )));
        }

        let number = |i: usize| {
            fields[i].parse::<u32>().map_err(|_| {
                Error::Config(format!("line {}: invalid number '{}'", line_no + 1, fields[i]))
            })
        };
        let coding_rate: CodingRate = fields[2]
            .parse()
            .map_err(|err| Error::Config(format!("line {}: {err}", line_no + 1)))?;
        let preamble = if fields.len() == 6 { number(5)? } else { 0 };

        waveforms.push(Waveform::new(
            number(0)?,
            number(1)?,
            coding_rate,
            number(3)?,
            number(4)?,
            preamble,
        )?);
    }
    Ok(waveforms)
}

fn read_default_waveform(path: &Path) -> Result<u32> {
    let contents = fs::read_to_string(path)?;
    contents
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<u32>().ok())
        .ok_or_else(|| Error::load(path, "expected a waveform id"))
}
