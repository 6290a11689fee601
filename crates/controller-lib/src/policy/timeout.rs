//! Periodic bounded-random-walk policy
//!
//! Used to explore the scaling space: every `countdown` applications it
//! draws a bounded random delta with a random sign. The feedback records
//! it exports pair the state before and after each step so the learning
//! service can fit the response surface.

use super::{window_performance, FeedbackSink, FeedbackTracker, PolicyConfig, ScalingPolicy};
use crate::window::MetricsWindow;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

pub struct TimeoutPolicy {
    config: PolicyConfig,
    countdown: i32,
    feedback: FeedbackTracker,
}

impl TimeoutPolicy {
    pub fn new(config: PolicyConfig, sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            countdown: config.countdown,
            config,
            feedback: FeedbackTracker::new(sink),
        }
    }
}

#[async_trait]
impl ScalingPolicy for TimeoutPolicy {
    async fn apply(&mut self, window: &MetricsWindow) -> i32 {
        let snapshots = window.snapshot();
        let Some((performance, last)) = window_performance(&snapshots) else {
            return 0;
        };

        self.feedback.flush(performance, &last).await;

        let mut delta = 0;
        if self.countdown <= 0
            && self.config.step_max > 1
            && last.number_of_nodes < self.config.upper_bound
        {
            let mut rng = rand::rng();
            delta = rng.random_range(1..self.config.step_max);
            if rng.random_bool(0.5) {
                delta = -delta;
            }
            self.countdown = self.config.countdown;
        }

        // Hard floor, independent of the autoscaler's downscale flag
        if last.number_of_nodes + delta < self.config.lower_bound {
            delta = 0;
        }

        self.countdown -= 1;

        debug!(
            cluster = %last.cluster_name,
            delta,
            countdown = self.countdown,
            performance,
            "Timeout policy applied"
        );

        if delta != 0 {
            self.feedback.open(delta, performance, &last);
        }

        delta
    }
}
