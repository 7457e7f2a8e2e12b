//! BTU, time slot and frame configuration
//!
//! A frame is a block of equal carriers (one BTU each) sharing a duration.
//! Every carrier is divided into time slots; slot ids are assigned in
//! insertion order across the whole frame.

use std::collections::BTreeMap;

use satlink_common::{CarrierBandwidthType, Error, Result, MAX_TIME_SLOT_COUNT};
use tracing::trace;

/// Time slot id, unique within a frame
pub type TimeSlotId = u16;

/// Bandwidth time unit: the bandwidth and symbol-rate definition of one carrier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BtuConf {
    allocated_bandwidth_hz: f64,
    occupied_bandwidth_hz: f64,
    effective_bandwidth_hz: f64,
}

impl BtuConf {
    /// Creates a BTU. `roll_off` and `spacing` must lie in `[0, 1)`.
    pub fn new(bandwidth_hz: f64, roll_off: f64, spacing: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&roll_off) {
            return Err(Error::Config(format!("roll-off {roll_off} outside [0, 1)")));
        }
        if !(0.0..1.0).contains(&spacing) {
            return Err(Error::Config(format!("carrier spacing {spacing} outside [0, 1)")));
        }
        if !(bandwidth_hz > 0.0 && bandwidth_hz.is_finite()) {
            return Err(Error::Config(format!("invalid carrier bandwidth {bandwidth_hz} Hz")));
        }

        Ok(Self {
            allocated_bandwidth_hz: bandwidth_hz,
            occupied_bandwidth_hz: bandwidth_hz / (1.0 + roll_off),
            effective_bandwidth_hz: bandwidth_hz / (1.0 + roll_off + spacing),
        })
    }

    pub fn allocated_bandwidth_hz(&self) -> f64 {
        self.allocated_bandwidth_hz
    }

    pub fn occupied_bandwidth_hz(&self) -> f64 {
        self.occupied_bandwidth_hz
    }

    pub fn effective_bandwidth_hz(&self) -> f64 {
        self.effective_bandwidth_hz
    }

    /// Symbol rate in baud, equal to the effective bandwidth.
    pub fn symbol_rate(&self) -> f64 {
        self.effective_bandwidth_hz
    }

    /// Duration of one symbol in seconds.
    pub fn length_s(&self) -> f64 {
        1.0 / self.effective_bandwidth_hz
    }

    /// Bandwidth of the given type.
    pub fn bandwidth_hz(&self, bandwidth_type: CarrierBandwidthType) -> f64 {
        match bandwidth_type {
            CarrierBandwidthType::Allocated => self.allocated_bandwidth_hz,
            CarrierBandwidthType::Occupied => self.occupied_bandwidth_hz,
            CarrierBandwidthType::Effective => self.effective_bandwidth_hz,
        }
    }
}

/// What a time slot may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotType {
    /// Control messages only
    Control,
    /// User traffic only
    #[default]
    Traffic,
    /// Either
    ControlOrTraffic,
}

/// One time slot of one carrier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSlotConf {
    /// Start time relative to the frame start, in seconds
    pub start_time_s: f64,
    /// Waveform transmitted in the slot
    pub waveform_id: u32,
    /// Carrier within the frame
    pub carrier_id: u16,
    /// Slot type
    pub slot_type: SlotType,
    /// Request class the slot is granted to
    pub rc_index: u8,
}

impl TimeSlotConf {
    /// Creates a traffic slot for request class 0.
    pub fn new(start_time_s: f64, waveform_id: u32, carrier_id: u16) -> Self {
        Self {
            start_time_s,
            waveform_id,
            carrier_id,
            slot_type: SlotType::default(),
            rc_index: 0,
        }
    }

    /// Returns the slot with `slot_type` set.
    pub fn with_slot_type(mut self, slot_type: SlotType) -> Self {
        self.slot_type = slot_type;
        self
    }
}

/// Frame: carriers of one BTU and their time slots.
#[derive(Debug, Clone)]
pub struct FrameConf {
    bandwidth_hz: f64,
    duration_s: f64,
    btu: BtuConf,
    carrier_count: u16,
    random_access: bool,
    time_slots: BTreeMap<TimeSlotId, TimeSlotConf>,
    carrier_slots: BTreeMap<u16, Vec<TimeSlotId>>,
}

impl FrameConf {
    /// Creates a frame of `bandwidth_hz / btu bandwidth` carriers and adds
    /// `time_slots` in order.
    pub fn new(
        bandwidth_hz: f64,
        duration_s: f64,
        btu: BtuConf,
        time_slots: Vec<TimeSlotConf>,
        random_access: bool,
    ) -> Result<Self> {
        if !(bandwidth_hz.is_finite() && bandwidth_hz > 0.0) {
            return Err(Error::Config(format!(
                "frame bandwidth must be positive, got {bandwidth_hz} Hz"
            )));
        }
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(Error::Config(format!(
                "frame duration must be positive, got {duration_s} s"
            )));
        }
        let ratio = bandwidth_hz / btu.allocated_bandwidth_hz();
        let carriers = ratio.round();
        if carriers < 1.0 || (ratio - carriers).abs() > 1e-6 * carriers {
            return Err(Error::Config(format!(
                "frame bandwidth {bandwidth_hz} Hz is not a whole number of {} Hz carriers",
                btu.allocated_bandwidth_hz()
            )));
        }
        if carriers > u16::MAX as f64 {
            return Err(Error::Budget(format!("{carriers} carriers in one frame")));
        }

        let mut frame = Self {
            bandwidth_hz,
            duration_s,
            btu,
            carrier_count: carriers as u16,
            random_access,
            time_slots: BTreeMap::new(),
            carrier_slots: BTreeMap::new(),
        };
        for slot in time_slots {
            frame.add_time_slot(slot)?;
        }
        Ok(frame)
    }

    /// Adds a slot and returns its id, the next free sequential id.
    pub fn add_time_slot(&mut self, slot: TimeSlotConf) -> Result<TimeSlotId> {
        if self.time_slots.len() >= MAX_TIME_SLOT_COUNT {
            return Err(Error::Budget(format!(
                "frame already holds the maximum of {MAX_TIME_SLOT_COUNT} time slots"
            )));
        }
        self.check_carrier(slot.carrier_id)?;

        let id = self.time_slots.len() as TimeSlotId;
        self.time_slots.insert(id, slot);
        self.carrier_slots.entry(slot.carrier_id).or_default().push(id);
        trace!(slot = id, carrier = slot.carrier_id, "Time slot added");
        Ok(id)
    }

    pub fn bandwidth_hz(&self) -> f64 {
        self.bandwidth_hz
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    pub fn btu(&self) -> &BtuConf {
        &self.btu
    }

    pub fn carrier_count(&self) -> u16 {
        self.carrier_count
    }

    pub fn is_random_access(&self) -> bool {
        self.random_access
    }

    /// Total number of time slots in the frame.
    pub fn time_slot_count(&self) -> usize {
        self.time_slots.len()
    }

    /// Bandwidth of one carrier.
    pub fn carrier_bandwidth_hz(&self, bandwidth_type: CarrierBandwidthType) -> f64 {
        self.btu.bandwidth_hz(bandwidth_type)
    }

    /// Center frequency of `carrier_id` relative to the frame start.
    pub fn carrier_frequency_hz(&self, carrier_id: u16) -> Result<f64> {
        self.check_carrier(carrier_id)?;
        let carrier_bandwidth = self.btu.allocated_bandwidth_hz();
        Ok(carrier_bandwidth * carrier_id as f64 + carrier_bandwidth / 2.0)
    }

    /// Slot `id`.
    pub fn time_slot_conf(&self, id: TimeSlotId) -> Result<&TimeSlotConf> {
        self.time_slots.get(&id).ok_or_else(|| {
            Error::out_of_range("time slot", id, self.time_slots.len() as u64)
        })
    }

    /// The `index`th slot of `carrier_id`.
    pub fn time_slot_conf_at(&self, carrier_id: u16, index: usize) -> Result<&TimeSlotConf> {
        let ids = self.time_slot_ids(carrier_id)?;
        let id = ids
            .get(index)
            .ok_or_else(|| Error::out_of_range("time slot index", index as u64, ids.len() as u64))?;
        self.time_slot_conf(*id)
    }

    /// Slot ids of `carrier_id`, in insertion order.
    pub fn time_slot_ids(&self, carrier_id: u16) -> Result<&[TimeSlotId]> {
        self.check_carrier(carrier_id)?;
        Ok(self
            .carrier_slots
            .get(&carrier_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// All slots in id order.
    pub fn time_slots(&self) -> impl Iterator<Item = (TimeSlotId, &TimeSlotConf)> {
        self.time_slots.iter().map(|(id, slot)| (*id, slot))
    }

    fn check_carrier(&self, carrier_id: u16) -> Result<()> {
        if carrier_id >= self.carrier_count {
            return Err(Error::out_of_range("carrier", carrier_id, self.carrier_count));
        }
        Ok(())
    }
}
