//! Control-plane library for autoscaling a fleet of compute clusters
//!
//! This crate provides the core functionality for:
//! - Heartbeat ingestion from cluster masters
//! - Per-cluster metrics windows and the managed-cluster abstraction
//! - Pluggable scaling policies with learning-service feedback export
//! - The per-cluster autoscaling control loop and the cluster pool
//! - A job write-ahead log for crash recovery

pub mod autoscaler;
pub mod cluster;
pub mod heartbeat;
pub mod models;
pub mod observability;
pub mod policy;
pub mod pool;
pub mod predictor;
pub mod proto;
pub mod provider;
pub mod store;
pub mod wal;
pub mod window;

pub use autoscaler::Autoscaler;
pub use cluster::{ManagedCluster, ProviderCluster};
pub use heartbeat::{HeartbeatReceiver, MonitoringDefaults};
pub use models::Metrics;
pub use observability::ControllerMetrics;
pub use policy::{MemoryPolicy, PolicyConfig, ScalingPolicy, TimeoutPolicy};
pub use pool::{ClusterPool, PoolEntry};
pub use predictor::{PredictorClient, PredictorConfig};
pub use provider::{AttachedCluster, ProviderDriver};
pub use store::{FileProvisionStore, ProvisionStore};
pub use wal::{JobLedger, JobRecord, JobState, Wal};
pub use window::MetricsWindow;
