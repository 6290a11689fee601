//! Controller configuration

use anyhow::Result;
use serde::Deserialize;

/// Controller configuration, loaded from `FLEET_`-prefixed environment
/// variables with sensible defaults for local runs.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// UDP bind address for inbound heartbeats
    #[serde(default = "default_heartbeat_addr")]
    pub heartbeat_addr: String,

    /// HTTP port for health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Learning-service endpoint for feedback records
    #[serde(default = "default_predictor_endpoint")]
    pub predictor_endpoint: String,

    /// Seconds between control-loop ticks for adopted clusters
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Whether adopted clusters may be scaled down
    #[serde(default)]
    pub allow_downscale: bool,

    /// Snapshots retained per cluster metrics window
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Exclusive bound on the timeout policy's random step
    #[serde(default = "default_step_max")]
    pub policy_step_max: i32,

    /// Applications between timeout-policy decisions
    #[serde(default = "default_countdown")]
    pub policy_countdown: i32,

    /// Node-count ceiling enforced by the timeout policy
    #[serde(default = "default_upper_bound")]
    pub policy_upper_bound: i32,

    /// Node-count floor enforced by every policy
    #[serde(default = "default_lower_bound")]
    pub policy_lower_bound: i32,

    /// Path of the job write-ahead log
    #[serde(default = "default_wal_path")]
    pub wal_path: String,

    /// Path of the provisioned-cluster name list
    #[serde(default = "default_provisioned_path")]
    pub provisioned_path: String,
}

fn default_heartbeat_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_api_port() -> u16 {
    8088
}

fn default_predictor_endpoint() -> String {
    "http://learning-service:9090".to_string()
}

fn default_tick_secs() -> u64 {
    60
}

fn default_window_capacity() -> usize {
    10
}

fn default_step_max() -> i32 {
    15
}

fn default_countdown() -> i32 {
    2
}

fn default_upper_bound() -> i32 {
    50
}

fn default_lower_bound() -> i32 {
    2
}

fn default_wal_path() -> String {
    "/var/lib/fleet-controller/jobs.wal".to_string()
}

fn default_provisioned_path() -> String {
    "/var/lib/fleet-controller/provisioned.json".to_string()
}

impl ControllerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FLEET"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ControllerConfig {
            heartbeat_addr: default_heartbeat_addr(),
            api_port: default_api_port(),
            predictor_endpoint: default_predictor_endpoint(),
            tick_secs: default_tick_secs(),
            allow_downscale: false,
            window_capacity: default_window_capacity(),
            policy_step_max: default_step_max(),
            policy_countdown: default_countdown(),
            policy_upper_bound: default_upper_bound(),
            policy_lower_bound: default_lower_bound(),
            wal_path: default_wal_path(),
            provisioned_path: default_provisioned_path(),
        }))
    }
}
