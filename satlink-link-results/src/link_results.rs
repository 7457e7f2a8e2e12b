//! Return- and forward-link results
//!
//! Both link directions keep one [`LookUpTable`] per waveform or MODCOD. The
//! tables are read by an explicit `initialize()` call; querying before that
//! is an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use satlink_common::{
    log_table_loaded, BbFrameType, Error, LinkDirection, LinkResultsConfig, ModCod, Result,
    DVB_S2_MODCODS,
};
use tracing::debug;

use crate::lookup::LookUpTable;

/// Common lifecycle of the link result sets.
pub trait LinkResults {
    /// Reads every curve of the set.
    fn initialize(&mut self) -> Result<()>;

    /// Returns true once `initialize` has succeeded.
    fn is_initialized(&self) -> bool;
}

/// Return-link (DVB-RCS2) results, Eb/N0 curves keyed by waveform id.
#[derive(Debug, Clone)]
pub struct LinkResultsRtn {
    dir: PathBuf,
    waveform_ids: Vec<u32>,
    tables: BTreeMap<u32, LookUpTable>,
    initialized: bool,
}

impl LinkResultsRtn {
    /// DVB-RCS2 results for `waveform_ids`, read from
    /// `<dir>/rcs2_waveformat<id>.txt` on initialization.
    pub fn dvb_rcs2<P: AsRef<Path>>(dir: P, waveform_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            waveform_ids: waveform_ids.into_iter().collect(),
            tables: BTreeMap::new(),
            initialized: false,
        }
    }

    /// Path of the curve for `waveform_id`.
    pub fn curve_path(&self, waveform_id: u32) -> PathBuf {
        self.dir.join(format!("rcs2_waveformat{waveform_id}.txt"))
    }

    /// BLER of `waveform_id` at `eb_no_db`.
    pub fn bler(&self, waveform_id: u32, eb_no_db: f64) -> Result<f64> {
        Ok(self.table(waveform_id)?.bler(eb_no_db))
    }

    /// Eb/N0 (dB) that `waveform_id` needs to reach `target_bler`.
    pub fn eb_no_db(&self, waveform_id: u32, target_bler: f64) -> Result<f64> {
        Ok(self.table(waveform_id)?.es_no_db(target_bler))
    }

    fn table(&self, waveform_id: u32) -> Result<&LookUpTable> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.tables.get(&waveform_id).ok_or_else(|| {
            Error::Unsupported(format!("no link results for waveform {waveform_id}"))
        })
    }
}

impl LinkResults for LinkResultsRtn {
    fn initialize(&mut self) -> Result<()> {
        let mut tables = BTreeMap::new();
        for &id in &self.waveform_ids {
            let path = self.curve_path(id);
            debug!(waveform_id = id, path = %path.display(), "Loading DVB-RCS2 curve");
            tables.insert(id, LookUpTable::load(&path)?);
        }
        log_table_loaded(LinkDirection::Return, "link results", &self.dir, tables.len());
        self.tables = tables;
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Forward-link (DVB-S2) results, Es/N0 curves of normal frames keyed by MODCOD.
///
/// Short frames are assumed to need a fixed Es/N0 offset more than normal
/// frames at the same BLER.
#[derive(Debug, Clone)]
pub struct LinkResultsFwd {
    dir: PathBuf,
    short_frame_offset_db: f64,
    tables: BTreeMap<ModCod, LookUpTable>,
    initialized: bool,
}

impl LinkResultsFwd {
    /// DVB-S2 results, read from `<dir>/s2_<modcod>.txt` on initialization.
    pub fn dvb_s2<P: AsRef<Path>>(dir: P, config: &LinkResultsConfig) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            short_frame_offset_db: config.short_frame_es_no_offset_db,
            tables: BTreeMap::new(),
            initialized: false,
        }
    }

    /// Path of the curve for `modcod`, e.g. `s2_qpsk_1_to_2.txt`.
    pub fn curve_path(&self, modcod: ModCod) -> PathBuf {
        self.dir
            .join(format!("s2_{}.txt", modcod.name().to_lowercase()))
    }

    /// Es/N0 offset applied to short frames (dB).
    pub fn short_frame_offset_db(&self) -> f64 {
        self.short_frame_offset_db
    }

    /// BLER of `modcod` in a `frame_type` frame at `es_no_db`.
    pub fn bler(&self, modcod: ModCod, frame_type: BbFrameType, es_no_db: f64) -> Result<f64> {
        let table = self.table(modcod)?;
        let es_no_db = match frame_type {
            BbFrameType::Normal => es_no_db,
            BbFrameType::Short => es_no_db - self.short_frame_offset_db,
            BbFrameType::Dummy => return Err(dummy_frame_error()),
        };
        Ok(table.bler(es_no_db))
    }

    /// Es/N0 (dB) that `modcod` in a `frame_type` frame needs to reach `target_bler`.
    pub fn es_no_db(&self, modcod: ModCod, frame_type: BbFrameType, target_bler: f64) -> Result<f64> {
        let es_no_db = self.table(modcod)?.es_no_db(target_bler);
        match frame_type {
            BbFrameType::Normal => Ok(es_no_db),
            BbFrameType::Short => Ok(es_no_db + self.short_frame_offset_db),
            BbFrameType::Dummy => Err(dummy_frame_error()),
        }
    }

    fn table(&self, modcod: ModCod) -> Result<&LookUpTable> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.tables
            .get(&modcod)
            .ok_or_else(|| Error::Unsupported(format!("no link results for {modcod}")))
    }
}

fn dummy_frame_error() -> Error {
    Error::Unsupported("dummy frames carry no payload and have no link results".to_string())
}

impl LinkResults for LinkResultsFwd {
    fn initialize(&mut self) -> Result<()> {
        let mut tables = BTreeMap::new();
        for modcod in DVB_S2_MODCODS {
            let path = self.curve_path(modcod);
            debug!(%modcod, path = %path.display(), "Loading DVB-S2 curve");
            tables.insert(modcod, LookUpTable::load(&path)?);
        }
        log_table_loaded(LinkDirection::Forward, "link results", &self.dir, tables.len());
        self.tables = tables;
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
