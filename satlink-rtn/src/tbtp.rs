//! Terminal burst time plan messages and their bounded history

use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::frame::TimeSlotId;

/// Logon id of a return-link terminal
pub type TerminalId = u16;

/// One TBTP: the time slots granted to each terminal in one superframe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TbtpMessage {
    superframe_seq_id: u8,
    superframe_counter: u16,
    assignments: BTreeMap<TerminalId, Vec<(u8, TimeSlotId)>>,
    ra_channels: Vec<u8>,
}

impl TbtpMessage {
    pub fn new(superframe_seq_id: u8, superframe_counter: u16) -> Self {
        Self {
            superframe_seq_id,
            superframe_counter,
            ..Self::default()
        }
    }

    pub fn superframe_seq_id(&self) -> u8 {
        self.superframe_seq_id
    }

    pub fn superframe_counter(&self) -> u16 {
        self.superframe_counter
    }

    /// Grants slot `slot_id` of frame `frame_id` to `terminal`.
    pub fn assign_time_slot(&mut self, terminal: TerminalId, frame_id: u8, slot_id: TimeSlotId) {
        self.assignments
            .entry(terminal)
            .or_default()
            .push((frame_id, slot_id));
    }

    /// Opens RA channel `ra_channel` in this superframe.
    pub fn add_ra_channel(&mut self, ra_channel: u8) {
        if !self.ra_channels.contains(&ra_channel) {
            self.ra_channels.push(ra_channel);
        }
    }

    /// (frame id, slot id) pairs granted to `terminal`.
    pub fn time_slots(&self, terminal: TerminalId) -> &[(u8, TimeSlotId)] {
        self.assignments
            .get(&terminal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Terminals with at least one slot.
    pub fn terminals(&self) -> impl Iterator<Item = TerminalId> + '_ {
        self.assignments.keys().copied()
    }

    pub fn ra_channels(&self) -> &[u8] {
        &self.ra_channels
    }

    /// Total number of granted slots.
    pub fn assigned_slot_count(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }
}

/// Bounded history of the TBTPs sent on one beam.
///
/// Messages get sequential ids starting at 0. Once `capacity` messages are
/// held, each insertion evicts the oldest one.
#[derive(Debug, Clone)]
pub struct TbtpContainer {
    capacity: usize,
    next_id: u32,
    messages: VecDeque<TbtpMessage>,
}

impl TbtpContainer {
    /// Creates an empty history. `capacity` is raised to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_id: 0,
            messages: VecDeque::new(),
        }
    }

    /// Stores `message` and returns its id.
    pub fn add(&mut self, message: TbtpMessage) -> u32 {
        if self.messages.len() == self.capacity {
            let evicted = self.oldest_id();
            self.messages.pop_front();
            trace!(id = ?evicted, "TBTP evicted");
        }
        let id = self.next_id;
        self.messages.push_back(message);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Message `id`, unless it was never sent or has been evicted.
    pub fn get(&self, id: u32) -> Option<&TbtpMessage> {
        let offset = id.wrapping_sub(self.oldest_id()?) as usize;
        self.messages.get(offset)
    }

    /// Id of the oldest message held.
    pub fn oldest_id(&self) -> Option<u32> {
        if self.messages.is_empty() {
            return None;
        }
        Some(self.next_id.wrapping_sub(self.messages.len() as u32))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
