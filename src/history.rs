//! Rolling window of recent power readings
//!
//! A fixed ring of [`HISTORY_CAPACITY`] samples. Index 0 is always the newest
//! sample; pushing past capacity drops the oldest one. Nothing here allocates
//! after construction.

use crate::median::{self, SampleField};
use crate::protocol::InverterSnapshot;
use serde::{Deserialize, Serialize};

pub const HISTORY_CAPACITY: usize = 10;

/// The subset of a snapshot the rules look at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSample {
    /// Milliseconds since service start
    pub timestamp_ms: u64,
    pub pv_power: i32,
    pub soc: i32,
    pub battery_power: i16,
    pub load_power: i16,
    pub feed_in_power: i32,
}

impl PowerSample {
    pub fn from_snapshot(timestamp_ms: u64, snapshot: &InverterSnapshot) -> Self {
        Self {
            timestamp_ms,
            pv_power: snapshot.pv_power(),
            soc: snapshot.soc,
            battery_power: snapshot.battery_power,
            load_power: snapshot.load_power,
            feed_in_power: snapshot.feed_in_power,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PowerSampleHistory {
    buf: [PowerSample; HISTORY_CAPACITY],
    // next slot to write
    head: usize,
    filled: usize,
}

impl Default for PowerSampleHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerSampleHistory {
    pub fn new() -> Self {
        Self {
            buf: [PowerSample::default(); HISTORY_CAPACITY],
            head: 0,
            filled: 0,
        }
    }

    /// Insert `sample` as the newest entry
    pub fn push(&mut self, sample: PowerSample) {
        self.buf[self.head] = sample;
        self.head = (self.head + 1) % HISTORY_CAPACITY;
        if self.filled < HISTORY_CAPACITY {
            self.filled += 1;
        }
    }

    /// True once every slot has been written at least once
    pub fn is_ready(&self) -> bool {
        self.filled == HISTORY_CAPACITY
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn capacity(&self) -> usize {
        HISTORY_CAPACITY
    }

    /// Sample at `index`, 0 being the newest
    pub fn get(&self, index: usize) -> Option<&PowerSample> {
        if index >= self.filled {
            return None;
        }
        let slot = (self.head + HISTORY_CAPACITY - 1 - index) % HISTORY_CAPACITY;
        Some(&self.buf[slot])
    }

    pub fn latest(&self) -> Option<&PowerSample> {
        self.get(0)
    }

    /// Iterate newest -> oldest
    pub fn iter(&self) -> impl Iterator<Item = &PowerSample> + '_ {
        (0..self.filled).filter_map(move |i| self.get(i))
    }

    pub fn median_of(&self, field: SampleField) -> Option<i32> {
        median::median_of(self, field)
    }

    /// Owned copy of the held samples, newest first
    pub fn to_vec(&self) -> Vec<PowerSample> {
        self.iter().copied().collect()
    }
}
