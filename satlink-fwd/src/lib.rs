//! DVB-S2 forward-link framing
//!
//! Computes BBFrame durations and payloads per MODCOD and selects the
//! MODCOD for a terminal from its estimated C/N0.
//!
//! ```rust
//! use satlink_common::{BbFrameConfig, BbFrameType, ModCod};
//! use satlink_fwd::BbFrameConf;
//!
//! let conf = BbFrameConf::new(&BbFrameConfig::default(), 1.0e6).unwrap();
//! let length = conf
//!     .bb_frame_length(ModCod::Qpsk1_2, BbFrameType::Short, 1.0e6)
//!     .unwrap();
//! assert!((length - 8.37e-3).abs() < 1e-12);
//! ```

pub mod bbframe;

pub use bbframe::{BbFrameConf, DvbS2Waveform};
