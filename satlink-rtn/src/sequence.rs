//! Superframe sequence
//!
//! The sequence owns the superframes of the return link, the waveform table
//! they share and the per-beam history of sent TBTPs. Global carrier ids
//! count through the superframes in order.

use std::collections::HashMap;

use satlink_common::{
    CarrierBandwidthType, Error, Result, SequenceConfig, SuperframeConfig,
};
use tracing::{debug, info};

use crate::superframe::Superframe;
use crate::tbtp::{TbtpContainer, TbtpMessage};
use crate::waveform::WaveformConf;

/// Minimum number of TBTPs kept per beam
pub const MIN_TBTP_STORE_COUNT: usize = 2;

/// Beam identifier
pub type BeamId = u32;

/// Ordered superframes plus the shared waveform table and TBTP history.
#[derive(Debug, Clone)]
pub struct SuperframeSequence {
    superframes: Vec<Superframe>,
    waveform_conf: WaveformConf,
    target_duration_s: f64,
    tbtp_store_time_ns: u64,
    tbtp_history: HashMap<BeamId, TbtpContainer>,
}

impl SuperframeSequence {
    /// Creates an empty sequence.
    pub fn new(waveform_conf: WaveformConf, config: &SequenceConfig) -> Self {
        Self {
            superframes: Vec::new(),
            waveform_conf,
            target_duration_s: config.target_duration_s(),
            tbtp_store_time_ns: config.tbtp_store_time_ms.saturating_mul(1_000_000),
            tbtp_history: HashMap::new(),
        }
    }

    /// Configures one superframe from `superframe_config` and returns the
    /// sequence holding it.
    pub fn build(
        superframe_config: &SuperframeConfig,
        sequence_config: &SequenceConfig,
        waveform_conf: WaveformConf,
    ) -> Result<Self> {
        let mut sequence = Self::new(waveform_conf, sequence_config);
        let superframe = Superframe::configure(
            superframe_config,
            sequence_config.allocated_bandwidth_hz,
            sequence.target_duration_s,
            &sequence.waveform_conf,
        )?;
        sequence.add_superframe(superframe);

        sequence.waveform_conf.log_summary();
        info!(
            superframes = sequence.superframe_count(),
            carriers = sequence.carrier_count(),
            "Superframe sequence ready"
        );
        Ok(sequence)
    }

    /// Appends a superframe.
    pub fn add_superframe(&mut self, superframe: Superframe) {
        debug!(
            id = self.superframes.len(),
            carriers = superframe.carrier_count(),
            "Superframe added to sequence"
        );
        self.superframes.push(superframe);
    }

    pub fn superframe_count(&self) -> usize {
        self.superframes.len()
    }

    /// Superframe `id`.
    pub fn superframe_conf(&self, id: usize) -> Result<&Superframe> {
        self.superframes.get(id).ok_or_else(|| {
            Error::out_of_range("superframe", id as u64, self.superframes.len() as u64)
        })
    }

    pub fn waveform_conf(&self) -> &WaveformConf {
        &self.waveform_conf
    }

    /// Target superframe duration in seconds.
    pub fn target_duration_s(&self) -> f64 {
        self.target_duration_s
    }

    /// Duration of superframe `id`.
    pub fn duration_s(&self, id: usize) -> Result<f64> {
        Ok(self.superframe_conf(id)?.duration_s())
    }

    /// Carriers over all superframes.
    pub fn carrier_count(&self) -> u32 {
        self.superframes.iter().map(Superframe::carrier_count).sum()
    }

    /// Carriers of superframe `id`.
    pub fn superframe_carrier_count(&self, id: usize) -> Result<u32> {
        Ok(self.superframe_conf(id)?.carrier_count())
    }

    /// Global id of carrier `frame_carrier_id` of frame `frame_id` in
    /// superframe `superframe_id`.
    pub fn carrier_id(
        &self,
        superframe_id: usize,
        frame_id: usize,
        frame_carrier_id: u16,
    ) -> Result<u32> {
        let local = self
            .superframe_conf(superframe_id)?
            .carrier_id(frame_id, frame_carrier_id)?;
        let preceding: u32 = self.superframes[..superframe_id]
            .iter()
            .map(Superframe::carrier_count)
            .sum();
        Ok(preceding + local)
    }

    /// Center frequency of global carrier `carrier_id`.
    pub fn carrier_frequency_hz(&self, carrier_id: u32) -> Result<f64> {
        let (superframe_id, local_id, start_hz) = self.locate(carrier_id)?;
        Ok(start_hz + self.superframes[superframe_id].carrier_frequency_hz(local_id)?)
    }

    /// Bandwidth of global carrier `carrier_id`.
    pub fn carrier_bandwidth_hz(
        &self,
        carrier_id: u32,
        bandwidth_type: CarrierBandwidthType,
    ) -> Result<f64> {
        let (superframe_id, local_id, _) = self.locate(carrier_id)?;
        self.superframes[superframe_id].carrier_bandwidth_hz(local_id, bandwidth_type)
    }

    /// Number of TBTPs kept per beam.
    ///
    /// Derived from the store time and the duration of the first superframe,
    /// both counted in whole nanoseconds.
    pub fn tbtp_store_count(&self) -> Result<usize> {
        let first = self
            .superframes
            .first()
            .ok_or_else(|| Error::Config("no superframe in sequence".to_string()))?;
        let duration_ns = (first.duration_s() * 1e9).round() as u64;
        let count = self
            .tbtp_store_time_ns
            .checked_div(duration_ns)
            .unwrap_or(0) as usize;
        Ok(count.max(MIN_TBTP_STORE_COUNT))
    }

    /// Records a TBTP sent on `beam` and returns its message id.
    pub fn add_tbtp_message(&mut self, beam: BeamId, message: TbtpMessage) -> Result<u32> {
        if !self.tbtp_history.contains_key(&beam) {
            let capacity = self.tbtp_store_count()?;
            debug!(beam, capacity, "TBTP history created");
            self.tbtp_history.insert(beam, TbtpContainer::new(capacity));
        }
        let container = self
            .tbtp_history
            .get_mut(&beam)
            .ok_or_else(|| Error::Config(format!("no TBTP history for beam {beam}")))?;
        Ok(container.add(message))
    }

    /// TBTP `id` sent on `beam`; `None` if unknown or already evicted.
    pub fn tbtp_message(&self, beam: BeamId, id: u32) -> Option<&TbtpMessage> {
        self.tbtp_history.get(&beam)?.get(id)
    }

    /// Resolves a global carrier into (superframe, local carrier, start frequency).
    fn locate(&self, carrier_id: u32) -> Result<(usize, u32, f64)> {
        let mut first = 0u32;
        let mut start_hz = 0.0;
        for (id, superframe) in self.superframes.iter().enumerate() {
            let count = superframe.carrier_count();
            if carrier_id < first + count {
                return Ok((id, carrier_id - first, start_hz));
            }
            first += count;
            start_hz += superframe.bandwidth_hz();
        }
        Err(Error::out_of_range("carrier", carrier_id, self.carrier_count()))
    }
}
