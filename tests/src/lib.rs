//! Integration test framework for satlink
//!
//! This crate provides fixtures and helpers for testing the link crates
//! together against the reference data in `data/`.
//!
//! # Components
//!
//! - [`test_fixtures`] - Reference data paths and scenario builders
//! - [`test_utils`] - Logging setup and float assertions
//!
//! # Test Categories
//!
//! 1. **Waveform sweep** - Return-link ACM over a C/N0 sweep
//! 2. **Superframe layout** - Carrier ids, frequencies and RA channels
//! 3. **BBFrame properties** - Forward-link framing and MODCOD selection
//! 4. **TBTP history** - Per-beam bounded TBTP storage

pub mod test_fixtures;
pub mod test_utils;

pub use test_fixtures::{data_dir, link_results_dir, waveform_dir, TestScenario};
pub use test_utils::{assert_close, init_test_logging, TestResult};
