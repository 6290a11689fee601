//! Cluster-provider driver boundary
//!
//! The controller never talks to a cloud API directly; it issues attach,
//! scale and release requests through this trait and lets the deployment
//! plug in a provider-specific driver.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// Handle returned when attaching to an already-provisioned cluster
#[derive(Debug, Clone)]
pub struct AttachedCluster {
    pub name: String,
    pub nodes: i32,
}

/// Driver for the external cluster-management backend.
///
/// `scale` is asynchronous at the provider layer: it returns once the
/// resize request has been issued, not once nodes are ready.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Attach to an existing cluster by name
    async fn attach_existing(&self, name: &str) -> Result<AttachedCluster>;

    /// Request `delta.abs()` nodes to be added (delta > 0) or removed (delta < 0)
    async fn scale(&self, name: &str, delta: i32) -> Result<()>;

    /// Release any provider resources associated with `name`
    async fn release_resources(&self, name: &str) -> Result<()>;
}

/// Driver that only logs the requests it receives.
///
/// Stands at the provider boundary until a cloud-specific driver is wired
/// in; also useful for running the controller against replayed telemetry.
#[derive(Default)]
pub struct LogOnlyDriver {
    requests: Mutex<Vec<String>>,
}

impl LogOnlyDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests issued so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("driver log poisoned").clone()
    }

    fn record(&self, request: String) {
        self.requests.lock().expect("driver log poisoned").push(request);
    }
}

#[async_trait]
impl ProviderDriver for LogOnlyDriver {
    async fn attach_existing(&self, name: &str) -> Result<AttachedCluster> {
        info!(cluster = %name, "Attach requested");
        self.record(format!("attach {name}"));
        // Node count is learned from the first heartbeat
        Ok(AttachedCluster {
            name: name.to_string(),
            nodes: 0,
        })
    }

    async fn scale(&self, name: &str, delta: i32) -> Result<()> {
        info!(cluster = %name, delta, "Scale requested");
        self.record(format!("scale {name} {delta}"));
        Ok(())
    }

    async fn release_resources(&self, name: &str) -> Result<()> {
        info!(cluster = %name, "Release requested");
        self.record(format!("release {name}"));
        Ok(())
    }
}
