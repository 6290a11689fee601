//! Prometheus metrics for the fleet controller
//!
//! Registered once process-wide; `ControllerMetrics` is a cheap handle to
//! the global instance and may be created wherever an increment is needed.

use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};
use std::sync::OnceLock;

static GLOBAL_METRICS: OnceLock<ControllerMetricsInner> = OnceLock::new();

struct ControllerMetricsInner {
    heartbeats_received: IntCounter,
    heartbeat_decode_failures: IntCounter,
    clusters_monitored: IntGauge,
    scale_operations: IntCounter,
    feedback_sent: IntCounter,
    feedback_failures: IntCounter,
}

impl ControllerMetricsInner {
    fn new() -> Self {
        Self {
            heartbeats_received: register_int_counter!(
                "fleet_controller_heartbeats_received_total",
                "Heartbeat datagrams decoded and routed"
            )
            .expect("Failed to register heartbeats_received"),

            heartbeat_decode_failures: register_int_counter!(
                "fleet_controller_heartbeat_decode_failures_total",
                "Heartbeat datagrams dropped because they failed to decode"
            )
            .expect("Failed to register heartbeat_decode_failures"),

            clusters_monitored: register_int_gauge!(
                "fleet_controller_clusters_monitored",
                "Clusters currently registered in the pool"
            )
            .expect("Failed to register clusters_monitored"),

            scale_operations: register_int_counter!(
                "fleet_controller_scale_operations_total",
                "Scale requests forwarded to the provider driver"
            )
            .expect("Failed to register scale_operations"),

            feedback_sent: register_int_counter!(
                "fleet_controller_feedback_records_sent_total",
                "Feedback records exported to the learning service"
            )
            .expect("Failed to register feedback_sent"),

            feedback_failures: register_int_counter!(
                "fleet_controller_feedback_export_failures_total",
                "Feedback records dropped because the export failed"
            )
            .expect("Failed to register feedback_failures"),
        }
    }
}

/// Handle to the process-wide controller metrics
#[derive(Clone)]
pub struct ControllerMetrics {
    _private: (),
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ControllerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ControllerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_heartbeats_received(&self) {
        self.inner().heartbeats_received.inc();
    }

    pub fn inc_decode_failures(&self) {
        self.inner().heartbeat_decode_failures.inc();
    }

    pub fn set_clusters_monitored(&self, count: i64) {
        self.inner().clusters_monitored.set(count);
    }

    pub fn inc_scale_operations(&self) {
        self.inner().scale_operations.inc();
    }

    pub fn inc_feedback_sent(&self) {
        self.inner().feedback_sent.inc();
    }

    pub fn inc_feedback_failures(&self) {
        self.inner().feedback_failures.inc();
    }
}
