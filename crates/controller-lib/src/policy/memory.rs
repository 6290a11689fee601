//! Memory-utilization policy
//!
//! Sizes the cluster from its memory backlog: the average deficit between
//! pending and available memory across the window, divided by the average
//! per-node memory capacity, is the number of nodes to add (or, when the
//! deficit is negative, remove).

use super::{window_performance, FeedbackSink, FeedbackTracker, PolicyConfig, ScalingPolicy};
use crate::window::MetricsWindow;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct MemoryPolicy {
    config: PolicyConfig,
    feedback: FeedbackTracker,
}

impl MemoryPolicy {
    pub fn new(config: PolicyConfig, sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            config,
            feedback: FeedbackTracker::new(sink),
        }
    }
}

#[async_trait]
impl ScalingPolicy for MemoryPolicy {
    async fn apply(&mut self, window: &MetricsWindow) -> i32 {
        let snapshots = window.snapshot();
        let Some((performance, last)) = window_performance(&snapshots) else {
            return 0;
        };

        self.feedback.flush(performance, &last).await;

        let mut deficit_sum = 0f64;
        let mut capacity_sum = 0f64;
        for s in &snapshots {
            deficit_sum += (s.pending_mb - s.available_mb) as f64;
            if s.number_of_nodes > 0 {
                capacity_sum += (s.allocated_mb + s.available_mb) as f64 / s.number_of_nodes as f64;
            }
        }

        let count = snapshots.len() as f64;
        let capacity = capacity_sum / count;
        if capacity <= 0.0 {
            return 0;
        }

        let mut delta = (deficit_sum / count / capacity) as i32;

        // Hard floor, independent of the autoscaler's downscale flag
        if last.number_of_nodes + delta < self.config.lower_bound {
            delta = 0;
        }

        debug!(
            cluster = %last.cluster_name,
            delta,
            capacity_mb = capacity,
            performance,
            "Memory policy applied"
        );

        if delta != 0 {
            self.feedback.open(delta, performance, &last);
        }

        delta
    }
}
