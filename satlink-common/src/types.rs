//! Physical-layer types shared by the forward and return link.
//!
//! MODCODs, coding rates, frame types and bandwidth types. All mappings are
//! immutable tables expressed as `match` arms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of bits in a byte
pub const BITS_PER_BYTE: u32 = 8;

/// Length of a DVB-RCS2 short burst in symbols
pub const SHORT_BURST_LENGTH: u32 = 536;

/// Length of a DVB-RCS2 long burst in symbols
pub const LONG_BURST_LENGTH: u32 = 1616;

/// Maximum number of time slots in one frame. Slot ids are `0..MAX_TIME_SLOT_COUNT`.
pub const MAX_TIME_SLOT_COUNT: usize = 2048;

/// FEC coding rate expressed as a fraction `numerator/denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodingRate {
    /// Information bits
    pub numerator: u32,
    /// Coded bits
    pub denominator: u32,
}

impl CodingRate {
    /// Creates a coding rate, rejecting zero terms and rates above one.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 || numerator > denominator {
            return Err(Error::Config(format!(
                "invalid coding rate {numerator}/{denominator}"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Returns the rate as a fraction in `(0, 1]`.
    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for CodingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for CodingRate {
    type Err = Error;

    /// Parses `"a/b"`. The token must split into exactly two parts.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 {
            return Err(Error::Config(format!(
                "coding rate '{s}' has {} parts, expected 2",
                parts.len()
            )));
        }
        let parse = |p: &str| {
            p.trim()
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("invalid coding rate term '{p}' in '{s}'")))
        };
        CodingRate::new(parse(parts[0])?, parse(parts[1])?)
    }
}

/// Modulation and coding combination.
///
/// The first 24 variants are the DVB-S2 MODCODs used on the forward link.
/// `Qpsk1_3`, `Qam16_3_4` and `Qam16_5_6` only occur in DVB-RCS2 waveforms.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModCod {
    /// QPSK 1/2
    #[serde(rename = "QPSK_1_TO_2")]
    Qpsk1_2,
    /// QPSK 2/3
    #[serde(rename = "QPSK_2_TO_3")]
    Qpsk2_3,
    /// QPSK 3/4
    #[serde(rename = "QPSK_3_TO_4")]
    Qpsk3_4,
    /// QPSK 3/5
    #[serde(rename = "QPSK_3_TO_5")]
    Qpsk3_5,
    /// QPSK 4/5
    #[serde(rename = "QPSK_4_TO_5")]
    Qpsk4_5,
    /// QPSK 5/6
    #[serde(rename = "QPSK_5_TO_6")]
    Qpsk5_6,
    /// QPSK 8/9
    #[serde(rename = "QPSK_8_TO_9")]
    Qpsk8_9,
    /// QPSK 9/10
    #[serde(rename = "QPSK_9_TO_10")]
    Qpsk9_10,
    /// 8PSK 2/3
    #[serde(rename = "8PSK_2_TO_3")]
    Psk8_2_3,
    /// 8PSK 3/4
    #[serde(rename = "8PSK_3_TO_4")]
    Psk8_3_4,
    /// 8PSK 3/5
    #[serde(rename = "8PSK_3_TO_5")]
    Psk8_3_5,
    /// 8PSK 5/6
    #[serde(rename = "8PSK_5_TO_6")]
    Psk8_5_6,
    /// 8PSK 8/9
    #[serde(rename = "8PSK_8_TO_9")]
    Psk8_8_9,
    /// 8PSK 9/10
    #[serde(rename = "8PSK_9_TO_10")]
    Psk8_9_10,
    /// 16APSK 2/3
    #[serde(rename = "16APSK_2_TO_3")]
    Apsk16_2_3,
    /// 16APSK 3/4
    #[serde(rename = "16APSK_3_TO_4")]
    Apsk16_3_4,
    /// 16APSK 4/5
    #[serde(rename = "16APSK_4_TO_5")]
    Apsk16_4_5,
    /// 16APSK 5/6
    #[serde(rename = "16APSK_5_TO_6")]
    Apsk16_5_6,
    /// 16APSK 8/9
    #[serde(rename = "16APSK_8_TO_9")]
    Apsk16_8_9,
    /// 16APSK 9/10
    #[serde(rename = "16APSK_9_TO_10")]
    Apsk16_9_10,
    /// 32APSK 3/4
    #[serde(rename = "32APSK_3_TO_4")]
    Apsk32_3_4,
    /// 32APSK 4/5
    #[serde(rename = "32APSK_4_TO_5")]
    Apsk32_4_5,
    /// 32APSK 5/6
    #[serde(rename = "32APSK_5_TO_6")]
    Apsk32_5_6,
    /// 32APSK 8/9
    #[serde(rename = "32APSK_8_TO_9")]
    Apsk32_8_9,
    /// QPSK 1/3 (DVB-RCS2 only)
    #[serde(rename = "QPSK_1_TO_3")]
    Qpsk1_3,
    /// 16QAM 3/4 (DVB-RCS2 only)
    #[serde(rename = "16QAM_3_TO_4")]
    Qam16_3_4,
    /// 16QAM 5/6 (DVB-RCS2 only)
    #[serde(rename = "16QAM_5_TO_6")]
    Qam16_5_6,
}

/// Every MODCOD supported on the DVB-S2 forward link
pub const DVB_S2_MODCODS: [ModCod; 24] = [
    ModCod::Qpsk1_2,
    ModCod::Qpsk2_3,
    ModCod::Qpsk3_4,
    ModCod::Qpsk3_5,
    ModCod::Qpsk4_5,
    ModCod::Qpsk5_6,
    ModCod::Qpsk8_9,
    ModCod::Qpsk9_10,
    ModCod::Psk8_2_3,
    ModCod::Psk8_3_4,
    ModCod::Psk8_3_5,
    ModCod::Psk8_5_6,
    ModCod::Psk8_8_9,
    ModCod::Psk8_9_10,
    ModCod::Apsk16_2_3,
    ModCod::Apsk16_3_4,
    ModCod::Apsk16_4_5,
    ModCod::Apsk16_5_6,
    ModCod::Apsk16_8_9,
    ModCod::Apsk16_9_10,
    ModCod::Apsk32_3_4,
    ModCod::Apsk32_4_5,
    ModCod::Apsk32_5_6,
    ModCod::Apsk32_8_9,
];

const ALL_MODCODS: [ModCod; 27] = [
    ModCod::Qpsk1_2,
    ModCod::Qpsk2_3,
    ModCod::Qpsk3_4,
    ModCod::Qpsk3_5,
    ModCod::Qpsk4_5,
    ModCod::Qpsk5_6,
    ModCod::Qpsk8_9,
    ModCod::Qpsk9_10,
    ModCod::Psk8_2_3,
    ModCod::Psk8_3_4,
    ModCod::Psk8_3_5,
    ModCod::Psk8_5_6,
    ModCod::Psk8_8_9,
    ModCod::Psk8_9_10,
    ModCod::Apsk16_2_3,
    ModCod::Apsk16_3_4,
    ModCod::Apsk16_4_5,
    ModCod::Apsk16_5_6,
    ModCod::Apsk16_8_9,
    ModCod::Apsk16_9_10,
    ModCod::Apsk32_3_4,
    ModCod::Apsk32_4_5,
    ModCod::Apsk32_5_6,
    ModCod::Apsk32_8_9,
    ModCod::Qpsk1_3,
    ModCod::Qam16_3_4,
    ModCod::Qam16_5_6,
];

impl ModCod {
    /// Bits carried by one modulated symbol.
    pub const fn modulated_bits(&self) -> u32 {
        use ModCod::*;
        match self {
            Qpsk1_3 | Qpsk1_2 | Qpsk2_3 | Qpsk3_4 | Qpsk3_5 | Qpsk4_5 | Qpsk5_6 | Qpsk8_9
            | Qpsk9_10 => 2,
            Psk8_2_3 | Psk8_3_4 | Psk8_3_5 | Psk8_5_6 | Psk8_8_9 | Psk8_9_10 => 3,
            Apsk16_2_3 | Apsk16_3_4 | Apsk16_4_5 | Apsk16_5_6 | Apsk16_8_9 | Apsk16_9_10
            | Qam16_3_4 | Qam16_5_6 => 4,
            Apsk32_3_4 | Apsk32_4_5 | Apsk32_5_6 | Apsk32_8_9 => 5,
        }
    }

    /// FEC coding rate of this MODCOD.
    pub const fn coding_rate(&self) -> CodingRate {
        use ModCod::*;
        let (numerator, denominator) = match self {
            Qpsk1_3 => (1, 3),
            Qpsk1_2 => (1, 2),
            Qpsk2_3 | Psk8_2_3 | Apsk16_2_3 => (2, 3),
            Qpsk3_4 | Psk8_3_4 | Apsk16_3_4 | Apsk32_3_4 | Qam16_3_4 => (3, 4),
            Qpsk3_5 | Psk8_3_5 => (3, 5),
            Qpsk4_5 | Apsk16_4_5 | Apsk32_4_5 => (4, 5),
            Qpsk5_6 | Psk8_5_6 | Apsk16_5_6 | Apsk32_5_6 | Qam16_5_6 => (5, 6),
            Qpsk8_9 | Psk8_8_9 | Apsk16_8_9 | Apsk32_8_9 => (8, 9),
            Qpsk9_10 | Psk8_9_10 | Apsk16_9_10 => (9, 10),
        };
        CodingRate {
            numerator,
            denominator,
        }
    }

    /// Modulation name as used in names and file names (e.g. `"16APSK"`).
    pub const fn modulation_name(&self) -> &'static str {
        use ModCod::*;
        match self {
            Qpsk1_3 | Qpsk1_2 | Qpsk2_3 | Qpsk3_4 | Qpsk3_5 | Qpsk4_5 | Qpsk5_6 | Qpsk8_9
            | Qpsk9_10 => "QPSK",
            Psk8_2_3 | Psk8_3_4 | Psk8_3_5 | Psk8_5_6 | Psk8_8_9 | Psk8_9_10 => "8PSK",
            Apsk16_2_3 | Apsk16_3_4 | Apsk16_4_5 | Apsk16_5_6 | Apsk16_8_9 | Apsk16_9_10 => {
                "16APSK"
            }
            Apsk32_3_4 | Apsk32_4_5 | Apsk32_5_6 | Apsk32_8_9 => "32APSK",
            Qam16_3_4 | Qam16_5_6 => "16QAM",
        }
    }

    /// Returns true if the MODCOD is usable on the DVB-S2 forward link.
    pub fn is_dvb_s2(&self) -> bool {
        DVB_S2_MODCODS.contains(self)
    }

    /// Canonical name, e.g. `"QPSK_1_TO_2"`.
    pub fn name(&self) -> String {
        let rate = self.coding_rate();
        format!(
            "{}_{}_TO_{}",
            self.modulation_name(),
            rate.numerator,
            rate.denominator
        )
    }

    /// Maps a DVB-RCS2 waveform row (modulated bits and coding rate) to its MODCOD.
    pub fn from_rcs2(modulated_bits: u32, rate: CodingRate) -> Result<Self> {
        use ModCod::*;
        let modcod = match (modulated_bits, rate.numerator, rate.denominator) {
            (2, 1, 3) => Qpsk1_3,
            (2, 1, 2) => Qpsk1_2,
            (2, 2, 3) => Qpsk2_3,
            (2, 3, 4) => Qpsk3_4,
            (2, 5, 6) => Qpsk5_6,
            (3, 2, 3) => Psk8_2_3,
            (3, 3, 4) => Psk8_3_4,
            (3, 5, 6) => Psk8_5_6,
            (4, 3, 4) => Qam16_3_4,
            (4, 5, 6) => Qam16_5_6,
            _ => {
                return Err(Error::Unsupported(format!(
                    "no DVB-RCS2 MODCOD for {modulated_bits} modulated bits at rate {rate}"
                )))
            }
        };
        Ok(modcod)
    }
}

impl fmt::Display for ModCod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ModCod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        ALL_MODCODS
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| Error::Unsupported(format!("unknown MODCOD '{s}'")))
    }
}

/// DVB-S2 BBFrame type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BbFrameType {
    /// Short FECFRAME (16200 bits)
    Short,
    /// Normal FECFRAME (64800 bits)
    Normal,
    /// Dummy PLFRAME without payload
    Dummy,
}

impl fmt::Display for BbFrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BbFrameType::Short => write!(f, "SHORT_FRAME"),
            BbFrameType::Normal => write!(f, "NORMAL_FRAME"),
            BbFrameType::Dummy => write!(f, "DUMMY_FRAME"),
        }
    }
}

/// Which bandwidth of a carrier is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarrierBandwidthType {
    /// Allocated bandwidth, including roll-off and spacing
    #[default]
    Allocated,
    /// Occupied bandwidth, including roll-off
    Occupied,
    /// Effective bandwidth, equal to the symbol rate
    Effective,
}

/// DVB-RCS2 burst lengths in use on the return link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstLength {
    /// Short bursts only
    Short,
    /// Long bursts only
    Long,
    /// Both short and long bursts
    #[default]
    ShortAndLong,
}

impl BurstLength {
    /// Burst lengths in symbols, shortest first.
    pub fn supported_lengths(&self) -> &'static [u32] {
        match self {
            BurstLength::Short => &[SHORT_BURST_LENGTH],
            BurstLength::Long => &[LONG_BURST_LENGTH],
            BurstLength::ShortAndLong => &[SHORT_BURST_LENGTH, LONG_BURST_LENGTH],
        }
    }
}
