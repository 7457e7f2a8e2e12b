//! Common types and utilities for satlink
//!
//! This crate provides the error type, logging setup, configuration
//! structures and physical-layer enumerations shared by the forward-link and
//! return-link crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
pub mod units;

pub use config::{
    BbFrameConfig, BbFrameUsageMode, ConfigType, DataPaths, FrameAttributes, LinkResultsConfig,
    SatConfig, SequenceConfig, SuperframeConfig, SuperframePreset, WaveformConfig,
};
pub use error::{Error, Result};
pub use logging::{
    init_logging, init_logging_with_filter, log_acm_decision, log_table_loaded, LinkDirection,
    LogLevel,
};
pub use types::*;
pub use units::{db_to_linear, linear_to_db};
