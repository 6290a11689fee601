//! Scaling policies
//!
//! A policy maps a cluster's metrics window to a signed node delta
//! (positive grows, negative shrinks, zero is a no-op). Policies never
//! fail: on thin or garbled data they return zero. Each policy instance is
//! owned by exactly one autoscaler and may keep state across calls for
//! feedback bookkeeping.

pub mod memory;
pub mod timeout;

pub use memory::MemoryPolicy;
pub use timeout::TimeoutPolicy;

use crate::models::Metrics;
use crate::observability::ControllerMetrics;
use crate::proto;
use crate::window::MetricsWindow;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Pluggable scaling strategy
#[async_trait]
pub trait ScalingPolicy: Send {
    /// Decide a node delta for the given window. Must not mutate the window.
    async fn apply(&mut self, window: &MetricsWindow) -> i32;
}

/// Constants shared by the bundled policies
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Exclusive bound on the random-walk step magnitude
    pub step_max: i32,
    /// Number of applications between timeout-policy decisions
    pub countdown: i32,
    /// Node-count ceiling for the timeout policy
    pub upper_bound: i32,
    /// Hard node-count floor; deltas that would cross it are dropped
    pub lower_bound: i32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            step_max: 15,
            countdown: 2,
            upper_bound: 50,
            lower_bound: 2,
        }
    }
}

/// Destination for completed feedback records
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn export(&self, record: proto::FeedbackRecord) -> Result<()>;
}

/// Mean per-pair performance signal over a window, plus the newest snapshot.
///
/// Performance is container-release throughput minus the positive part of
/// the projected pending-backlog growth, averaged over consecutive snapshot
/// pairs. Returns `None` when the window holds fewer than two snapshots.
pub(crate) fn window_performance(snapshots: &[Metrics]) -> Option<(f32, Metrics)> {
    let mut throughput = 0f32;
    let mut pending_growth_rate = 0f32;
    let mut pairs = 0u32;

    for pair in snapshots.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);

        throughput +=
            (cur.aggregate_containers_released - prev.aggregate_containers_released) as f32;

        if cur.pending_containers > 0 {
            let memory_per_container = cur.pending_mb / cur.pending_containers;
            if memory_per_container > 0 {
                let absorbable = cur.available_mb / memory_per_container;
                let growth =
                    (cur.pending_containers - absorbable - prev.pending_containers) as f32;
                if growth > 0.0 {
                    pending_growth_rate += growth;
                }
            }
        }

        pairs += 1;
    }

    if pairs == 0 {
        return None;
    }

    let performance = throughput / pairs as f32 - pending_growth_rate / pairs as f32;
    snapshots.last().cloned().map(|last| (performance, last))
}

/// Feedback bookkeeping shared by the bundled policies.
///
/// Holds at most one outstanding record: a record opened by a scaling
/// decision must be flushed before the next one may be opened.
pub(crate) struct FeedbackTracker {
    outstanding: Option<proto::FeedbackRecord>,
    sink: Arc<dyn FeedbackSink>,
}

impl FeedbackTracker {
    pub(crate) fn new(sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            outstanding: None,
            sink,
        }
    }

    pub(crate) fn has_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Complete and export the outstanding record, if any.
    ///
    /// Export failures are logged and the record is dropped; a misbehaving
    /// learning service must never take down the control loop.
    pub(crate) async fn flush(&mut self, performance: f32, after: &Metrics) {
        let Some(mut record) = self.outstanding.take() else {
            return;
        };

        record.performance_after = performance;
        record.metrics_after = Some(after.into());

        info!(
            cluster = %after.cluster_name,
            scaling_factor = record.scaling_factor,
            "Exporting feedback record to learning service"
        );
        match self.sink.export(record).await {
            Ok(()) => ControllerMetrics::new().inc_feedback_sent(),
            Err(e) => {
                ControllerMetrics::new().inc_feedback_failures();
                warn!(
                    cluster = %after.cluster_name,
                    error = %e,
                    "Dropping feedback record, learning service unreachable"
                );
            }
        }
    }

    /// Open a new record for a non-zero decision unless one is outstanding
    pub(crate) fn open(&mut self, delta: i32, performance: f32, before: &Metrics) {
        if self.outstanding.is_some() {
            return;
        }

        self.outstanding = Some(proto::FeedbackRecord {
            nodes: before.number_of_nodes,
            scaling_factor: delta,
            performance_before: performance,
            performance_after: 0.0,
            metrics_before: Some(before.into()),
            metrics_after: None,
        });
        info!(
            cluster = %before.cluster_name,
            scaling_factor = delta,
            "Opened feedback record"
        );
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records exported feedback, optionally failing every call
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) exported: Mutex<Vec<proto::FeedbackRecord>>,
        pub(crate) fail: bool,
    }

    impl RecordingSink {
        pub(crate) fn failing() -> Self {
            Self {
                exported: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl FeedbackSink for RecordingSink {
        async fn export(&self, record: proto::FeedbackRecord) -> Result<()> {
            if self.fail {
                anyhow::bail!("learning service unavailable");
            }
            self.exported.lock().unwrap().push(record);
            Ok(())
        }
    }

    pub(crate) fn snapshot(cluster: &str, nodes: i32) -> Metrics {
        Metrics {
            cluster_name: cluster.to_string(),
            number_of_nodes: nodes,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::Metrics;

    fn pairable(nodes: i32, released: i32, pending: i32, pending_mb: i32, avail_mb: i32) -> Metrics {
        Metrics {
            cluster_name: "c1".to_string(),
            number_of_nodes: nodes,
            aggregate_containers_released: released,
            pending_containers: pending,
            pending_mb,
            available_mb: avail_mb,
            ..Default::default()
        }
    }

    #[test]
    fn test_performance_requires_two_snapshots() {
        assert!(window_performance(&[]).is_none());
        assert!(window_performance(&[snapshot("c1", 5)]).is_none());
    }

    #[test]
    fn test_performance_is_throughput_minus_backlog_growth() {
        // Pair 1: 10 containers released, no pending backlog
        // Pair 2: 20 released, projected growth (30 - 2000/200 - 5) = 15
        let snapshots = vec![
            pairable(10, 100, 0, 0, 0),
            pairable(10, 110, 5, 0, 0),
            pairable(10, 130, 30, 6000, 2000),
        ];

        let (performance, last) = window_performance(&snapshots).unwrap();
        assert_eq!(last.aggregate_containers_released, 130);
        // throughput (10 + 20) / 2 = 15, growth 15 / 2 = 7.5
        assert!((performance - 7.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_tracker_holds_at_most_one_record() {
        let sink = Arc::new(RecordingSink::default());
        let mut tracker = FeedbackTracker::new(sink.clone());

        let before = snapshot("c1", 10);
        tracker.open(3, 1.0, &before);
        assert!(tracker.has_outstanding());

        // A second decision may not replace the outstanding record
        tracker.open(-5, 2.0, &before);
        let after = snapshot("c1", 13);
        tracker.flush(4.0, &after).await;

        let exported = sink.exported.lock().unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].scaling_factor, 3);
        assert_eq!(exported[0].performance_after, 4.0);
        assert!(!tracker.has_outstanding());
    }

    #[tokio::test]
    async fn test_export_failure_drops_record() {
        let sink = Arc::new(RecordingSink::failing());
        let mut tracker = FeedbackTracker::new(sink);

        tracker.open(2, 0.0, &snapshot("c1", 10));
        tracker.flush(1.0, &snapshot("c1", 12)).await;

        // Record cleared even though the export failed
        assert!(!tracker.has_outstanding());
    }
}
