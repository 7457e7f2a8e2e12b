//! Error types for satlink

use std::path::PathBuf;

use thiserror::Error;

/// Error types for the satlink library.
///
/// Every variant except [`Error::Io`] and [`Error::YamlParse`] stands for a
/// setup-time defect. Callers are expected to abort the scenario on any of
/// them rather than continue with a partially built configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration attribute (e.g. roll-off outside `[0, 1)`).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Index outside the configured range.
    #[error("{what} {index} out of range (count {count})")]
    OutOfRange {
        /// Kind of index (frame, carrier, time slot, ...)
        what: &'static str,
        /// Requested index
        index: u64,
        /// Number of valid entries
        count: u64,
    },

    /// Enumeration value or combination that has no mapping.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Resource budget exceeded (bandwidth, slot or channel ceilings).
    #[error("Budget exceeded: {0}")]
    Budget(String),

    /// Malformed or inconsistent input data.
    #[error("Load error in {}: {reason}", path.display())]
    Load {
        /// File being loaded
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Link results queried before they were initialized.
    #[error("Link results not initialized, call initialize() first")]
    NotInitialized,

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

impl Error {
    /// Shorthand for [`Error::OutOfRange`].
    pub fn out_of_range(what: &'static str, index: impl Into<u64>, count: impl Into<u64>) -> Self {
        Error::OutOfRange {
            what,
            index: index.into(),
            count: count.into(),
        }
    }

    /// Shorthand for [`Error::Load`].
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for satlink operations
pub type Result<T> = std::result::Result<T, Error>;
