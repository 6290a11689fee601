//! Core data models for the fleet controller

use crate::proto;
use serde::{Deserialize, Serialize};

/// One point-in-time telemetry snapshot reported by a cluster master.
///
/// Immutable once constructed; produced by decoding a heartbeat datagram
/// and routed to the owning cluster's metrics window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub cluster_name: String,
    pub number_of_nodes: i32,
    pub allocated_mb: i32,
    pub allocated_vcores: i32,
    pub available_mb: i32,
    pub available_vcores: i32,
    pub pending_mb: i32,
    pub pending_vcores: i32,
    pub am_resource_limit_mb: i32,
    pub am_resource_limit_vcores: i32,
    pub used_am_resource_mb: i32,
    pub used_am_resource_vcores: i32,
    pub allocated_containers: i32,
    pub pending_containers: i32,
    pub aggregate_containers_allocated: i32,
    pub aggregate_containers_released: i32,
    pub aggregate_containers_preempted: i32,
    pub apps_submitted: i32,
    pub apps_running: i32,
    pub apps_pending: i32,
    pub apps_completed: i32,
    pub apps_killed: i32,
    pub apps_failed: i32,
    pub active_applications: i32,
    pub allocation_delay_num_ops: i64,
    pub allocation_delay_avg_ms: f32,
}

impl From<proto::Heartbeat> for Metrics {
    fn from(hb: proto::Heartbeat) -> Self {
        Self {
            cluster_name: hb.cluster_name,
            number_of_nodes: hb.number_of_nodes,
            allocated_mb: hb.allocated_mb,
            allocated_vcores: hb.allocated_vcores,
            available_mb: hb.available_mb,
            available_vcores: hb.available_vcores,
            pending_mb: hb.pending_mb,
            pending_vcores: hb.pending_vcores,
            am_resource_limit_mb: hb.am_resource_limit_mb,
            am_resource_limit_vcores: hb.am_resource_limit_vcores,
            used_am_resource_mb: hb.used_am_resource_mb,
            used_am_resource_vcores: hb.used_am_resource_vcores,
            allocated_containers: hb.allocated_containers,
            pending_containers: hb.pending_containers,
            aggregate_containers_allocated: hb.aggregate_containers_allocated,
            aggregate_containers_released: hb.aggregate_containers_released,
            aggregate_containers_preempted: hb.aggregate_containers_preempted,
            apps_submitted: hb.apps_submitted,
            apps_running: hb.apps_running,
            apps_pending: hb.apps_pending,
            apps_completed: hb.apps_completed,
            apps_killed: hb.apps_killed,
            apps_failed: hb.apps_failed,
            active_applications: hb.active_applications,
            allocation_delay_num_ops: hb.allocation_delay_num_ops,
            allocation_delay_avg_ms: hb.allocation_delay_avg_ms,
        }
    }
}

impl From<&Metrics> for proto::Heartbeat {
    fn from(m: &Metrics) -> Self {
        Self {
            cluster_name: m.cluster_name.clone(),
            number_of_nodes: m.number_of_nodes,
            allocated_mb: m.allocated_mb,
            allocated_vcores: m.allocated_vcores,
            available_mb: m.available_mb,
            available_vcores: m.available_vcores,
            pending_mb: m.pending_mb,
            pending_vcores: m.pending_vcores,
            am_resource_limit_mb: m.am_resource_limit_mb,
            am_resource_limit_vcores: m.am_resource_limit_vcores,
            used_am_resource_mb: m.used_am_resource_mb,
            used_am_resource_vcores: m.used_am_resource_vcores,
            allocated_containers: m.allocated_containers,
            pending_containers: m.pending_containers,
            aggregate_containers_allocated: m.aggregate_containers_allocated,
            aggregate_containers_released: m.aggregate_containers_released,
            aggregate_containers_preempted: m.aggregate_containers_preempted,
            apps_submitted: m.apps_submitted,
            apps_running: m.apps_running,
            apps_pending: m.apps_pending,
            apps_completed: m.apps_completed,
            apps_killed: m.apps_killed,
            apps_failed: m.apps_failed,
            active_applications: m.active_applications,
            allocation_delay_num_ops: m.allocation_delay_num_ops,
            allocation_delay_avg_ms: m.allocation_delay_avg_ms,
        }
    }
}
