//! Superframe configuration
//!
//! A superframe stacks frames in frequency. Carriers get a superframe-wide
//! id by counting through the frames in order, and every carrier of a
//! random-access frame becomes one RA channel.

use satlink_common::{CarrierBandwidthType, ConfigType, Error, Result, SuperframeConfig};
use tracing::{debug, info};

use crate::frame::{BtuConf, FrameConf, TimeSlotConf, TimeSlotId};
use crate::waveform::WaveformConf;

/// Maximum number of RA channels in a superframe
pub const MAX_RA_CHANNELS: usize = 255;

/// Location of an RA channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaChannel {
    /// Frame index in the superframe
    pub frame_id: usize,
    /// Carrier index in the frame
    pub frame_carrier_id: u16,
}

/// Superframe: ordered frames plus the random-access channel list.
#[derive(Debug, Clone, Default)]
pub struct Superframe {
    frames: Vec<FrameConf>,
    carrier_count: u32,
    ra_channels: Vec<RaChannel>,
    duration_s: f64,
}

impl Superframe {
    /// Creates an empty superframe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the frames described by `config`.
    ///
    /// Every carrier of every frame is filled with as many default-waveform
    /// slots as fit into `target_duration_s` (at least one). Fails if the
    /// frames need more than `allocated_bandwidth_hz`.
    pub fn configure(
        config: &SuperframeConfig,
        allocated_bandwidth_hz: f64,
        target_duration_s: f64,
        waveform_conf: &WaveformConf,
    ) -> Result<Self> {
        let config_type = config.config_type();
        match config_type {
            ConfigType::Type0 | ConfigType::Type1 | ConfigType::Type2 => {}
            ConfigType::Type3 => {
                return Err(Error::Unsupported(format!("{config_type} is not supported")))
            }
        }

        let frame_count = config.frame_count();
        if frame_count == 0 {
            return Err(Error::Config("superframe needs at least one frame".to_string()));
        }

        let default_id = waveform_conf.default_waveform_id();
        let default_waveform = waveform_conf.waveform(default_id)?;

        let mut superframe = Self::new();
        for frame_index in 0..frame_count {
            let attrs = config.frame(frame_index)?;
            let btu = BtuConf::new(
                attrs.carrier_allocated_bandwidth_hz,
                attrs.carrier_roll_off,
                attrs.carrier_spacing,
            )?;

            let slot_duration = default_waveform.burst_duration(btu.symbol_rate());
            let slot_count = ((target_duration_s / slot_duration).floor() as usize).max(1);
            let frame_duration = slot_count as f64 * slot_duration;

            let mut frame = FrameConf::new(
                attrs.allocated_bandwidth_hz,
                frame_duration,
                btu,
                Vec::new(),
                attrs.random_access,
            )?;
            for carrier in 0..frame.carrier_count() {
                for j in 0..slot_count {
                    let start = j as f64 * slot_duration;
                    frame.add_time_slot(TimeSlotConf::new(start, default_id, carrier))?;
                }
            }

            debug!(
                frame = frame_index,
                carriers = frame.carrier_count(),
                slots_per_carrier = slot_count,
                duration_s = frame_duration,
                random_access = attrs.random_access,
                "Frame configured"
            );
            superframe.add_frame(frame)?;
        }

        let used = superframe.bandwidth_hz();
        if used > allocated_bandwidth_hz {
            return Err(Error::Budget(format!(
                "superframe bandwidth {used} Hz exceeds allocated {allocated_bandwidth_hz} Hz"
            )));
        }

        info!(
            %config_type,
            frames = superframe.frame_count(),
            carriers = superframe.carrier_count(),
            ra_channels = superframe.ra_channel_count(),
            duration_s = superframe.duration_s(),
            "Superframe configured"
        );
        Ok(superframe)
    }

    /// Appends a frame. Carriers of a random-access frame become RA channels.
    pub fn add_frame(&mut self, frame: FrameConf) -> Result<()> {
        if frame.is_random_access() {
            let frame_id = self.frames.len();
            for carrier in 0..frame.carrier_count() {
                if self.ra_channels.len() >= MAX_RA_CHANNELS {
                    return Err(Error::Budget(format!(
                        "more than {MAX_RA_CHANNELS} RA channels"
                    )));
                }
                self.ra_channels.push(RaChannel {
                    frame_id,
                    frame_carrier_id: carrier,
                });
            }
        }

        self.carrier_count += frame.carrier_count() as u32;
        self.duration_s = self.duration_s.max(frame.duration_s());
        self.frames.push(frame);
        Ok(())
    }

    pub fn frames(&self) -> &[FrameConf] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame `index`.
    pub fn frame_conf(&self, index: usize) -> Result<&FrameConf> {
        self.frames
            .get(index)
            .ok_or_else(|| Error::out_of_range("frame", index as u64, self.frames.len() as u64))
    }

    /// Carriers over all frames.
    pub fn carrier_count(&self) -> u32 {
        self.carrier_count
    }

    /// Duration of the longest frame in seconds.
    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Bandwidth of all frames together.
    pub fn bandwidth_hz(&self) -> f64 {
        self.frames.iter().map(FrameConf::bandwidth_hz).sum()
    }

    /// Superframe-wide id of carrier `frame_carrier_id` of frame `frame_id`.
    pub fn carrier_id(&self, frame_id: usize, frame_carrier_id: u16) -> Result<u32> {
        let frame = self.frame_conf(frame_id)?;
        if frame_carrier_id >= frame.carrier_count() {
            return Err(Error::out_of_range(
                "carrier",
                frame_carrier_id,
                frame.carrier_count(),
            ));
        }
        let preceding: u32 = self.frames[..frame_id]
            .iter()
            .map(|f| f.carrier_count() as u32)
            .sum();
        Ok(preceding + frame_carrier_id as u32)
    }

    /// Frame index holding `carrier_id`.
    pub fn carrier_frame(&self, carrier_id: u32) -> Result<usize> {
        self.locate(carrier_id).map(|(frame_id, _, _)| frame_id)
    }

    /// Center frequency of `carrier_id` relative to the superframe start.
    pub fn carrier_frequency_hz(&self, carrier_id: u32) -> Result<f64> {
        let (frame_id, frame_carrier_id, frame_start_hz) = self.locate(carrier_id)?;
        Ok(frame_start_hz + self.frames[frame_id].carrier_frequency_hz(frame_carrier_id)?)
    }

    /// Bandwidth of `carrier_id`.
    pub fn carrier_bandwidth_hz(
        &self,
        carrier_id: u32,
        bandwidth_type: CarrierBandwidthType,
    ) -> Result<f64> {
        let frame_id = self.carrier_frame(carrier_id)?;
        Ok(self.frames[frame_id].carrier_bandwidth_hz(bandwidth_type))
    }

    /// Returns true if `carrier_id` belongs to a random-access frame.
    pub fn is_random_access_carrier(&self, carrier_id: u32) -> Result<bool> {
        let frame_id = self.carrier_frame(carrier_id)?;
        Ok(self.frames[frame_id].is_random_access())
    }

    /// RA channel index of `carrier_id`, or `None` for a dedicated-access carrier.
    pub fn ra_channel(&self, carrier_id: u32) -> Result<Option<usize>> {
        let (frame_id, frame_carrier_id, _) = self.locate(carrier_id)?;
        Ok(self
            .ra_channels
            .iter()
            .position(|ra| ra.frame_id == frame_id && ra.frame_carrier_id == frame_carrier_id))
    }

    pub fn ra_channel_count(&self) -> usize {
        self.ra_channels.len()
    }

    /// Location of RA channel `ra_channel`.
    pub fn ra_channel_conf(&self, ra_channel: usize) -> Result<RaChannel> {
        self.ra_channels.get(ra_channel).copied().ok_or_else(|| {
            Error::out_of_range("RA channel", ra_channel as u64, self.ra_channels.len() as u64)
        })
    }

    /// Frame index of RA channel `ra_channel`.
    pub fn ra_channel_frame_id(&self, ra_channel: usize) -> Result<usize> {
        Ok(self.ra_channel_conf(ra_channel)?.frame_id)
    }

    /// Time slot ids of RA channel `ra_channel`.
    pub fn ra_slots(&self, ra_channel: usize) -> Result<&[TimeSlotId]> {
        let ra = self.ra_channel_conf(ra_channel)?;
        self.frames[ra.frame_id].time_slot_ids(ra.frame_carrier_id)
    }

    /// Number of time slots of RA channel `ra_channel`.
    pub fn ra_slot_count(&self, ra_channel: usize) -> Result<usize> {
        Ok(self.ra_slots(ra_channel)?.len())
    }

    /// Payload of the waveform used in the RA frame of `ra_channel`.
    ///
    /// The waveform is the one configured in the first slot of the frame's
    /// first carrier.
    pub fn ra_channel_payload_bytes(
        &self,
        ra_channel: usize,
        waveform_conf: &WaveformConf,
    ) -> Result<u32> {
        let ra = self.ra_channel_conf(ra_channel)?;
        let slot = self.frames[ra.frame_id].time_slot_conf_at(0, 0)?;
        Ok(waveform_conf.waveform(slot.waveform_id)?.payload_bytes())
    }

    /// Resolves a carrier into (frame index, carrier in frame, frame start frequency).
    fn locate(&self, carrier_id: u32) -> Result<(usize, u16, f64)> {
        let mut first_in_frame = 0u32;
        let mut frame_start_hz = 0.0;
        for (frame_id, frame) in self.frames.iter().enumerate() {
            let count = frame.carrier_count() as u32;
            if carrier_id < first_in_frame + count {
                return Ok((frame_id, (carrier_id - first_in_frame) as u16, frame_start_hz));
            }
            first_in_frame += count;
            frame_start_hz += frame.bandwidth_hz();
        }
        Err(Error::out_of_range("carrier", carrier_id, self.carrier_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satlink_common::{FrameAttributes, SuperframePreset, WaveformConfig};

    use crate::waveform::parse_waveforms;

    fn waveforms() -> WaveformConf {
        let table = "3 2 1/3 38 536\n4 2 1/2 59 536\n5 2 1/3 123 1616\n";
        WaveformConf::new(
            parse_waveforms(table).unwrap(),
            3,
            &WaveformConfig::default(),
        )
        .unwrap()
    }

    fn frame(bandwidth_hz: f64, carrier_hz: f64, random_access: bool) -> FrameConf {
        let btu = BtuConf::new(carrier_hz, 0.2, 0.3).unwrap();
        let mut frame = FrameConf::new(bandwidth_hz, 0.01, btu, Vec::new(), random_access).unwrap();
        for carrier in 0..frame.carrier_count() {
            frame.add_time_slot(TimeSlotConf::new(0.0, 4, carrier)).unwrap();
            frame.add_time_slot(TimeSlotConf::new(0.005, 4, carrier)).unwrap();
        }
        frame
    }

    fn superframe() -> Superframe {
        let mut sf = Superframe::new();
        sf.add_frame(frame(1.0e6, 5.0e5, false)).unwrap();
        sf.add_frame(frame(1.5e6, 5.0e5, true)).unwrap();
        sf.add_frame(frame(1.0e6, 2.5e5, false)).unwrap();
        sf
    }

    #[test]
    fn test_add_frame_counts_carriers_and_ra_channels() {
        let sf = superframe();
        assert_eq!(sf.frame_count(), 3);
        assert_eq!(sf.carrier_count(), 2 + 3 + 4);
        assert_eq!(sf.ra_channel_count(), 3);
        assert_eq!(sf.bandwidth_hz(), 3.5e6);
        assert_eq!(
            sf.ra_channel_conf(2).unwrap(),
            RaChannel {
                frame_id: 1,
                frame_carrier_id: 2
            }
        );
    }

    #[test]
    fn test_carrier_id_and_frame() {
        let sf = superframe();
        assert_eq!(sf.carrier_id(0, 1).unwrap(), 1);
        assert_eq!(sf.carrier_id(1, 0).unwrap(), 2);
        assert_eq!(sf.carrier_id(2, 3).unwrap(), 8);
        assert!(sf.carrier_id(3, 0).is_err());
        assert!(sf.carrier_id(0, 2).is_err());

        assert_eq!(sf.carrier_frame(1).unwrap(), 0);
        assert_eq!(sf.carrier_frame(4).unwrap(), 1);
        assert_eq!(sf.carrier_frame(5).unwrap(), 2);
        assert!(sf.carrier_frame(9).is_err());
    }

    #[test]
    fn test_carrier_frequency_and_bandwidth() {
        let sf = superframe();
        assert_eq!(sf.carrier_frequency_hz(0).unwrap(), 2.5e5);
        assert_eq!(sf.carrier_frequency_hz(3).unwrap(), 1.0e6 + 7.5e5);
        assert_eq!(sf.carrier_frequency_hz(5).unwrap(), 2.5e6 + 1.25e5);
        assert_eq!(
            sf.carrier_bandwidth_hz(5, CarrierBandwidthType::Allocated)
                .unwrap(),
            2.5e5
        );
        assert!(
            (sf.carrier_bandwidth_hz(0, CarrierBandwidthType::Effective)
                .unwrap()
                - 5.0e5 / 1.5)
                .abs()
                < 1e-6
        );
        assert!(sf.carrier_frequency_hz(9).is_err());
    }

    #[test]
    fn test_random_access_queries() {
        let sf = superframe();
        assert!(!sf.is_random_access_carrier(1).unwrap());
        assert!(sf.is_random_access_carrier(3).unwrap());
        assert_eq!(sf.ra_channel(1).unwrap(), None);
        assert_eq!(sf.ra_channel(2).unwrap(), Some(0));
        assert_eq!(sf.ra_channel(4).unwrap(), Some(2));
        assert_eq!(sf.ra_channel_frame_id(1).unwrap(), 1);
        assert_eq!(sf.ra_slot_count(1).unwrap(), 2);
        assert_eq!(sf.ra_slots(0).unwrap(), &[0, 1]);
        assert_eq!(sf.ra_channel_payload_bytes(0, &waveforms()).unwrap(), 59);
        assert!(sf.ra_slots(3).is_err());
        assert!(sf.ra_channel_frame_id(3).is_err());
    }

    #[test]
    fn test_ra_channel_ceiling() {
        let mut sf = Superframe::new();
        let btu = BtuConf::new(1.0e4, 0.2, 0.3).unwrap();
        let big = FrameConf::new(2.56e6, 0.01, btu, Vec::new(), true).unwrap();
        assert_eq!(big.carrier_count(), 256);
        assert!(matches!(sf.add_frame(big), Err(Error::Budget(_))));
    }

    #[test]
    fn test_configure_preset0() {
        let config = SuperframeConfig::from_preset(SuperframePreset::Config0);
        let sf = Superframe::configure(&config, 1.25e8, 0.1, &waveforms()).unwrap();
        assert_eq!(sf.frame_count(), 10);
        assert_eq!(sf.carrier_count(), 9 * 10 + 1);
        assert_eq!(sf.ra_channel_count(), 1);

        // 536 symbols at 833.3 kbaud
        let slot: f64 = 536.0 / (1.25e6 / 1.5);
        let slots = (0.1 / slot).floor() as usize;
        let frame = sf.frame_conf(0).unwrap();
        assert_eq!(frame.time_slot_ids(0).unwrap().len(), slots);
        assert_eq!(frame.time_slot_count(), slots * 10);
        assert!((frame.duration_s() - slots as f64 * slot).abs() < 1e-12);
        assert!((sf.duration_s() - slots as f64 * slot).abs() < 1e-12);

        let second = frame.time_slot_conf_at(3, 1).unwrap();
        assert_eq!(second.waveform_id, 3);
        assert!((second.start_time_s - slot).abs() < 1e-15);
        assert_eq!(sf.ra_channel_payload_bytes(0, &waveforms()).unwrap(), 38);
    }

    #[test]
    fn test_configure_bandwidth_budget() {
        let config = SuperframeConfig::from_preset(SuperframePreset::Config1);
        assert!(Superframe::configure(&config, 1.25e7, 0.1, &waveforms()).is_ok());
        assert!(matches!(
            Superframe::configure(&config, 1.0e7, 0.1, &waveforms()),
            Err(Error::Budget(_))
        ));
    }

    #[test]
    fn test_configure_at_least_one_slot() {
        let config = SuperframeConfig {
            frame_count: Some(1),
            ..SuperframeConfig::from_preset(SuperframePreset::Config1)
        };
        let sf = Superframe::configure(&config, 1.25e6, 1e-6, &waveforms()).unwrap();
        assert_eq!(sf.frame_conf(0).unwrap().time_slot_ids(0).unwrap().len(), 1);
    }

    #[test]
    fn test_configure_rejects_type3_and_bad_attributes() {
        let config = SuperframeConfig {
            config_type: Some(ConfigType::Type3),
            ..SuperframeConfig::default()
        };
        assert!(matches!(
            Superframe::configure(&config, 1.25e8, 0.1, &waveforms()),
            Err(Error::Unsupported(_))
        ));

        let config = SuperframeConfig {
            frame_count: Some(1),
            frames: vec![FrameAttributes {
                allocated_bandwidth_hz: 1.25e6,
                carrier_allocated_bandwidth_hz: 1.25e5,
                carrier_roll_off: 1.2,
                carrier_spacing: 0.3,
                random_access: false,
            }],
            ..SuperframeConfig::default()
        };
        assert!(matches!(
            Superframe::configure(&config, 1.25e8, 0.1, &waveforms()),
            Err(Error::Config(_))
        ));

        let config = SuperframeConfig {
            frame_count: Some(0),
            ..SuperframeConfig::default()
        };
        assert!(Superframe::configure(&config, 1.25e8, 0.1, &waveforms()).is_err());
    }
}
