//! Latest published measurement set.
//!
//! The sensor worker is the only writer. It builds a complete `ReadingSet`
//! and swaps it in behind a short write lock, so readers always see every
//! channel from the same poll cycle.
use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::ChannelPolicy;

/// One calibrated current per configured channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSet {
    pub amps: Vec<f64>,
    /// Publish counter; 0 means nothing has been measured yet.
    pub seq: u64,
}

impl ReadingSet {
    pub fn empty(channels: usize) -> Self {
        Self {
            amps: vec![0.0; channels],
            seq: 0,
        }
    }

    /// Reduce the set to the single value used for display and alerting.
    pub fn select(&self, policy: ChannelPolicy) -> f64 {
        match policy {
            ChannelPolicy::First => self.amps.first().copied().unwrap_or(0.0),
            ChannelPolicy::Index(i) => self.amps.get(i).copied().unwrap_or(0.0),
            ChannelPolicy::Max => self.amps.iter().copied().fold(0.0, f64::max),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SharedReadings {
    inner: Arc<RwLock<Arc<ReadingSet>>>,
}

impl SharedReadings {
    pub fn new(channels: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(ReadingSet::empty(channels)))),
        }
    }

    /// Replace the whole set; returns the new sequence number.
    pub fn publish(&self, amps: Vec<f64>) -> u64 {
        let mut slot = self.inner.write();
        let seq = slot.seq.wrapping_add(1);
        *slot = Arc::new(ReadingSet { amps, seq });
        seq
    }

    /// Cheap handle to the current set; never blocks on the writer for long.
    pub fn latest(&self) -> Arc<ReadingSet> {
        self.inner.read().clone()
    }
}
