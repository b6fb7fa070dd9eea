//! Median filtering over the power sample window

use crate::history::{HISTORY_CAPACITY, PowerSample, PowerSampleHistory};

/// Which reading of a [`PowerSample`] to filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleField {
    PvPower,
    Soc,
    BatteryPower,
    LoadPower,
    FeedInPower,
}

impl SampleField {
    pub fn value(self, sample: &PowerSample) -> i32 {
        match self {
            SampleField::PvPower => sample.pv_power,
            SampleField::Soc => sample.soc,
            SampleField::BatteryPower => i32::from(sample.battery_power),
            SampleField::LoadPower => i32::from(sample.load_power),
            SampleField::FeedInPower => sample.feed_in_power,
        }
    }
}

/// Sort `values` in place and return the element at `len / 2`.
///
/// For an even count this is the upper of the two middle values.
pub fn upper_median(values: &mut [i32]) -> Option<i32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[values.len() / 2])
}

/// Median of `field` over every sample currently held by `history`
pub fn median_of(history: &PowerSampleHistory, field: SampleField) -> Option<i32> {
    let mut scratch = [0i32; HISTORY_CAPACITY];
    let mut count = 0;
    for sample in history.iter() {
        scratch[count] = field.value(sample);
        count += 1;
    }
    upper_median(&mut scratch[..count])
}
