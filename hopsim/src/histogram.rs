use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::{Hops, Message, SimulationError, TerminationTracker, error::Result};

/// Number of messages that needed exactly `hops` forwarding steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramEntry {
    pub hops: Hops,
    pub count: usize,
}

/// Delivery counts ordered ascending by hop count. Keys are unique and every
/// count is positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    entries: Vec<HistogramEntry>,
}

impl Histogram {
    fn from_buckets(buckets: BTreeMap<Hops, usize>) -> Self {
        Self {
            entries: buckets
                .into_iter()
                .filter(|&(_, count)| count > 0)
                .map(|(hops, count)| HistogramEntry { hops, count })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (Hops, usize)> + '_ {
        self.entries.iter().map(|entry| (entry.hops, entry.count))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_messages(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    pub fn max_hops(&self) -> Option<Hops> {
        self.entries.last().map(|entry| entry.hops)
    }

    pub fn mean_hops(&self) -> Option<f64> {
        let total = self.total_messages();
        if total == 0 {
            return None;
        }
        let hops: usize = self.entries.iter().map(|e| e.hops * e.count).sum();
        Some(hops as f64 / total as f64)
    }

    /// Adds every bucket of `other` into `self`, keeping the order.
    pub fn merge(&mut self, other: &Histogram) {
        let mut buckets: BTreeMap<Hops, usize> = self.iter().collect();
        for (hops, count) in other.iter() {
            *buckets.entry(hops).or_default() += count;
        }
        *self = Self::from_buckets(buckets);
    }
}

impl<'a> IntoIterator for &'a Histogram {
    type Item = &'a HistogramEntry;
    type IntoIter = std::slice::Iter<'a, HistogramEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Collects deliveries reported by sensors. Counting happens under the
/// aggregator's own lock, which is released before the tracker is told.
pub struct HistogramAggregator {
    buckets: Mutex<BTreeMap<Hops, usize>>,
    tracker: Arc<TerminationTracker>,
}

impl HistogramAggregator {
    pub(crate) fn new(tracker: Arc<TerminationTracker>) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            tracker,
        }
    }

    pub fn tracker(&self) -> &TerminationTracker {
        &self.tracker
    }

    /// Consumes a message that reached its destination.
    pub fn record_delivery(&self, message: Message) {
        if message.hops() == 0 {
            self.tracker.abort(SimulationError::violation(format!(
                "message {message} delivered without a single hop"
            )));
            return;
        }

        match self.buckets.lock() {
            Ok(mut buckets) => *buckets.entry(message.hops()).or_default() += 1,
            Err(_) => {
                self.tracker.abort(SimulationError::violation(
                    "histogram lock poisoned by a panicking sensor",
                ));
                return;
            }
        }

        self.tracker.on_delivery();
    }

    /// Final histogram. Only meaningful once every sensor has stopped.
    pub(crate) fn into_histogram(self) -> Result<Histogram> {
        let buckets = self.buckets.into_inner().map_err(|_| {
            SimulationError::violation("histogram lock poisoned by a panicking sensor")
        })?;
        let histogram = Histogram::from_buckets(buckets);

        let target = self.tracker.target();
        if histogram.total_messages() != target {
            return Err(SimulationError::violation(format!(
                "histogram accounts for {} messages, {target} were injected",
                histogram.total_messages()
            )));
        }
        Ok(histogram)
    }
}
