//! Per-cluster metrics window
//!
//! Bounded, insertion-ordered history of telemetry snapshots. The ingestion
//! path appends while an autoscaler tick iterates; iteration works over an
//! owned copy taken at call time so readers never hold up appenders.

use crate::models::Metrics;
use std::collections::VecDeque;
use std::sync::RwLock;

/// Default number of snapshots retained per cluster
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// Bounded ordered history of telemetry snapshots for one cluster.
///
/// Safe for concurrent appends and iteration. When the window is full the
/// oldest snapshot is evicted.
pub struct MetricsWindow {
    slots: RwLock<VecDeque<Metrics>>,
    capacity: usize,
}

impl MetricsWindow {
    /// Create a window retaining at most `capacity` snapshots
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Append a snapshot at the tail, evicting the oldest entry when full
    pub fn append(&self, snapshot: Metrics) {
        let mut slots = self.slots.write().expect("metrics window lock poisoned");
        while slots.len() >= self.capacity {
            slots.pop_front();
        }
        slots.push_back(snapshot);
    }

    /// Owned copy of the current contents, oldest to newest.
    ///
    /// Appends that land after this call are not visible to the returned
    /// sequence; a later call observes them in append order.
    pub fn snapshot(&self) -> Vec<Metrics> {
        let slots = self.slots.read().expect("metrics window lock poisoned");
        slots.iter().cloned().collect()
    }

    /// Most recent snapshot, if any
    pub fn latest(&self) -> Option<Metrics> {
        let slots = self.slots.read().expect("metrics window lock poisoned");
        slots.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.read().expect("metrics window lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
