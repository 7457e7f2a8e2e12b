//! DVB-RCS2 return-link framing
//!
//! This crate models the MF-TDMA structure of the return link and the
//! waveform table used by return-link ACM.
//!
//! # Modules
//!
//! - [`frame`]: BTU, time slot and frame configuration
//! - [`superframe`]: frames stacked in frequency, carrier ids and RA channels
//! - [`sequence`]: superframe sequence, global carrier ids and TBTP history
//! - [`tbtp`]: TBTP messages and the bounded per-beam container
//! - [`waveform`]: DVB-RCS2 waveform table and best-waveform selection
//!
//! # Example
//!
//! ```rust
//! use satlink_rtn::frame::{BtuConf, FrameConf, TimeSlotConf};
//!
//! let btu = BtuConf::new(1.25e6, 0.20, 0.30).unwrap();
//! let mut frame = FrameConf::new(2.5e6, 0.1, btu, Vec::new(), false).unwrap();
//! let id = frame.add_time_slot(TimeSlotConf::new(0.0, 3, 1)).unwrap();
//!
//! assert_eq!(frame.carrier_count(), 2);
//! assert_eq!(frame.time_slot_ids(1).unwrap(), &[id]);
//! assert_eq!(frame.carrier_frequency_hz(1).unwrap(), 1_875_000.0);
//! ```

pub mod frame;
pub mod sequence;
pub mod superframe;
pub mod tbtp;
pub mod waveform;

pub use frame::{BtuConf, FrameConf, SlotType, TimeSlotConf, TimeSlotId};
pub use sequence::{BeamId, SuperframeSequence, MIN_TBTP_STORE_COUNT};
pub use superframe::{RaChannel, Superframe, MAX_RA_CHANNELS};
pub use tbtp::{TbtpContainer, TbtpMessage, TerminalId};
pub use waveform::{
    parse_waveforms, read_waveforms, Waveform, WaveformConf, DEFAULT_WAVEFORM_ID,
};
