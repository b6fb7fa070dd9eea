//! Day-long chart of 5-minute running averages
//!
//! [`ChartAggregator`] keeps [`CHART_CAPACITY`] buckets in a ring, bucket 0
//! being the one currently accumulating. Bucket boundaries follow sample
//! timestamps only: a sample outside bucket 0's `[start, start + interval)`
//! window opens a new bucket starting at that sample.
//!
//! The window is half-open, so a sample exactly one interval after the start
//! already belongs to the next bucket and bucket 0 always satisfies
//! `start + interval > latest timestamp`.

use serde::{Deserialize, Serialize};

pub const BUCKET_INTERVAL_MS: u64 = 5 * 60 * 1000;
/// 24 hours of 5-minute buckets
pub const CHART_CAPACITY: usize = 288;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDataItem {
    pub bucket_start_ms: u64,
    pub sample_count: u32,
    pv_power: f64,
    load_power: f64,
    soc: f64,
}

impl ChartDataItem {
    fn open(bucket_start_ms: u64) -> Self {
        Self {
            bucket_start_ms,
            ..Self::default()
        }
    }

    fn mean(&self, value: f64) -> Option<f64> {
        (self.sample_count > 0).then_some(value)
    }

    pub fn pv_power(&self) -> Option<f64> {
        self.mean(self.pv_power)
    }

    pub fn load_power(&self) -> Option<f64> {
        self.mean(self.load_power)
    }

    pub fn soc(&self) -> Option<f64> {
        self.mean(self.soc)
    }

    pub fn contains(&self, timestamp_ms: u64) -> bool {
        timestamp_ms >= self.bucket_start_ms
            && timestamp_ms < self.bucket_start_ms.saturating_add(BUCKET_INTERVAL_MS)
    }

    fn merge(&mut self, pv_power: i32, load_power: i32, soc: i32) {
        let n = f64::from(self.sample_count);
        let blend = |old: f64, value: i32| old + (f64::from(value) - old) / (n + 1.0);
        self.pv_power = blend(self.pv_power, pv_power);
        self.load_power = blend(self.load_power, load_power);
        self.soc = blend(self.soc, soc);
        self.sample_count += 1;
    }
}

#[derive(Debug, Clone)]
pub struct ChartAggregator {
    buckets: [ChartDataItem; CHART_CAPACITY],
    // slot of bucket 0
    head: usize,
    len: usize,
}

impl Default for ChartAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartAggregator {
    pub fn new() -> Self {
        Self {
            buckets: [ChartDataItem::default(); CHART_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    /// Fold one reading into the current bucket, opening a new one first if
    /// the timestamp falls outside it.
    ///
    /// A timestamp earlier than the current bucket's start (the uptime clock
    /// restarted) also opens a new bucket rather than being merged backwards.
    pub fn add_sample(&mut self, timestamp_ms: u64, pv_power: i32, load_power: i32, soc: i32) {
        let needs_rotation = match self.latest() {
            Some(bucket) => !bucket.contains(timestamp_ms),
            None => true,
        };
        if needs_rotation {
            self.rotate(timestamp_ms);
        }
        self.buckets[self.head].merge(pv_power, load_power, soc);
    }

    fn rotate(&mut self, bucket_start_ms: u64) {
        self.head = (self.head + CHART_CAPACITY - 1) % CHART_CAPACITY;
        self.buckets[self.head] = ChartDataItem::open(bucket_start_ms);
        if self.len < CHART_CAPACITY {
            self.len += 1;
        }
    }

    /// Bucket at `index`, 0 being the newest
    pub fn get(&self, index: usize) -> Option<&ChartDataItem> {
        if index >= self.len {
            return None;
        }
        Some(&self.buckets[(self.head + index) % CHART_CAPACITY])
    }

    pub fn latest(&self) -> Option<&ChartDataItem> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate newest -> oldest
    pub fn iter(&self) -> impl Iterator<Item = &ChartDataItem> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<ChartDataItem> {
        self.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_opens_bucket() {
        let mut chart = ChartAggregator::new();
        assert!(chart.latest().is_none());
        chart.add_sample(0, 100, 50, 80);
        let bucket = chart.latest().copied().unwrap();
        assert_eq!(bucket.sample_count, 1);
        assert_eq!(bucket.bucket_start_ms, 0);
        assert_eq!(bucket.pv_power(), Some(100.0));
        assert_eq!(bucket.load_power(), Some(50.0));
        assert_eq!(bucket.soc(), Some(80.0));
    }

    #[test]
    fn running_mean_is_incremental() {
        let mut chart = ChartAggregator::new();
        chart.add_sample(1_000, 100, 0, 0);
        chart.add_sample(2_000, 200, 0, 0);
        assert_eq!(chart.latest().and_then(|b| b.pv_power()), Some(150.0));
        chart.add_sample(3_000, 600, 0, 0);
        assert_eq!(chart.latest().and_then(|b| b.pv_power()), Some(300.0));
        assert_eq!(chart.len(), 1);
    }

    #[test]
    fn window_is_half_open() {
        let mut chart = ChartAggregator::new();
        chart.add_sample(10_000, 100, 0, 0);
        chart.add_sample(10_000 + BUCKET_INTERVAL_MS - 1, 300, 0, 0);
        assert_eq!(chart.len(), 1);
        chart.add_sample(10_000 + BUCKET_INTERVAL_MS, 900, 0, 0);
        assert_eq!(chart.len(), 2);
        let newest = chart.latest().copied().unwrap();
        assert_eq!(newest.bucket_start_ms, 10_000 + BUCKET_INTERVAL_MS);
        assert_eq!(newest.pv_power(), Some(900.0));
        assert_eq!(chart.get(1).and_then(|b| b.pv_power()), Some(200.0));
    }

    #[test]
    fn backwards_timestamp_opens_bucket() {
        let mut chart = ChartAggregator::new();
        chart.add_sample(BUCKET_INTERVAL_MS, 1, 1, 1);
        chart.add_sample(0, 2, 2, 2);
        assert_eq!(chart.len(), 2);
        assert_eq!(chart.latest().map(|b| b.bucket_start_ms), Some(0));
    }

    #[test]
    fn ring_is_bounded() {
        let mut chart = ChartAggregator::new();
        for i in 0..(CHART_CAPACITY as u64 + 5) {
            chart.add_sample(i * BUCKET_INTERVAL_MS, i as i32, 0, 0);
        }
        assert_eq!(chart.len(), CHART_CAPACITY);
        assert_eq!(
            chart.latest().map(|b| b.bucket_start_ms),
            Some((CHART_CAPACITY as u64 + 4) * BUCKET_INTERVAL_MS)
        );
        assert_eq!(
            chart.get(CHART_CAPACITY - 1).map(|b| b.bucket_start_ms),
            Some(5 * BUCKET_INTERVAL_MS)
        );
        assert!(chart.get(CHART_CAPACITY).is_none());
    }

    #[test]
    fn empty_bucket_means_unreadable() {
        let item = ChartDataItem::open(0);
        assert_eq!(item.pv_power(), None);
        assert_eq!(item.soc(), None);
    }
}
