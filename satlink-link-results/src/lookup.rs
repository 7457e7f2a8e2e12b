//! BLER look-up table
//!
//! One curve of block error rate against SNR (Es/N0 or Eb/N0 in dB), read
//! from a whitespace-separated `snrDb blerValue` file.

use std::fs;
use std::path::{Path, PathBuf};

use satlink_common::{Error, Result};

/// BLER as a function of SNR, linearly interpolated between samples.
#[derive(Debug, Clone, PartialEq)]
pub struct LookUpTable {
    source: PathBuf,
    snr_db: Vec<f64>,
    bler: Vec<f64>,
}

impl LookUpTable {
    /// Loads a curve from `path`.
    ///
    /// SNR must strictly increase and BLER must not increase from row to
    /// row, and the file must hold at least one row.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let mut points = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let values: Vec<&str> = line.split_whitespace().collect();
            if values.len() != 2 {
                return Err(Error::load(
                    path,
                    format!("line {}: expected 2 columns, found {}", line_no + 1, values.len()),
                ));
            }
            let parse = |s: &str| {
                s.parse::<f64>().map_err(|_| {
                    Error::load(path, format!("line {}: invalid number '{s}'", line_no + 1))
                })
            };
            points.push((parse(values[0])?, parse(values[1])?));
        }

        let table = Self::from_points(&points).map_err(|err| match err {
            Error::Config(reason) => Error::load(path, reason),
            other => other,
        })?;
        Ok(Self {
            source: path.to_path_buf(),
            ..table
        })
    }

    /// Builds a curve from `(snr_db, bler)` samples.
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::Config("link result curve is empty".to_string()));
        }

        let mut last_snr = f64::NEG_INFINITY;
        let mut last_bler = 1.0;
        for &(snr, bler) in points {
            if snr <= last_snr || bler > last_bler {
                return Err(Error::Config(format!(
                    "link result curve is not properly sorted at ({snr}, {bler})"
                )));
            }
            last_snr = snr;
            last_bler = bler;
        }

        Ok(Self {
            source: PathBuf::new(),
            snr_db: points.iter().map(|p| p.0).collect(),
            bler: points.iter().map(|p| p.1).collect(),
        })
    }

    /// File the curve was read from (empty for in-memory curves).
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.snr_db.len()
    }

    /// Always false for a loaded table.
    pub fn is_empty(&self) -> bool {
        self.snr_db.is_empty()
    }

    /// BLER at `snr_db`.
    ///
    /// Below the first sample the block always fails (1.0); above the last it
    /// never does (0.0).
    pub fn bler(&self, snr_db: f64) -> f64 {
        let n = self.snr_db.len();
        if snr_db < self.snr_db[0] {
            return 1.0;
        }

        let mut i = 1;
        while i < n && snr_db > self.snr_db[i] {
            i += 1;
        }

        if i >= n {
            return 0.0;
        }

        interpolate(
            snr_db,
            self.snr_db[i - 1],
            self.snr_db[i],
            self.bler[i - 1],
            self.bler[i],
        )
    }

    /// SNR (dB) needed to reach `target_bler`.
    ///
    /// Clamps to the first sample when the target is above the curve and to
    /// the last sample when the curve never gets that low.
    pub fn es_no_db(&self, target_bler: f64) -> f64 {
        let n = self.bler.len();
        let Some(i) = self.bler.iter().position(|&b| b <= target_bler) else {
            return self.snr_db[n - 1];
        };

        if self.bler[i] == target_bler || i == 0 {
            return self.snr_db[i];
        }

        interpolate(
            target_bler,
            self.bler[i - 1],
            self.bler[i],
            self.snr_db[i - 1],
            self.snr_db[i],
        )
    }
}

fn interpolate(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) / (x1 - x0) * (x - x0)
}
