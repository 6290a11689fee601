//! Managed-cluster abstraction
//!
//! A single capability trait covers everything the control loop and the
//! ingestion path need from a cluster; concrete cluster types differ only
//! in which provider driver sits behind `scale`.

use crate::models::Metrics;
use crate::provider::ProviderDriver;
use crate::window::MetricsWindow;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Capability set implemented by any managed cluster
#[async_trait]
pub trait ManagedCluster: Send + Sync {
    /// Stable cluster identity
    fn name(&self) -> &str;

    /// Current tracked node count
    fn nodes(&self) -> i32;

    /// Append a snapshot to the metrics window and update the latest-snapshot
    /// field; atomic with respect to concurrent `latest_snapshot` reads
    fn record_snapshot(&self, snapshot: Metrics);

    /// Most recent snapshot recorded for this cluster
    fn latest_snapshot(&self) -> Option<Metrics>;

    /// Telemetry history feeding the scaling policy
    fn window(&self) -> &MetricsWindow;

    /// Request the provider to add (delta > 0) or remove (delta < 0) nodes.
    /// Returns once the request is issued.
    async fn scale(&self, delta: i32) -> Result<()>;
}

/// Cluster managed through a provider driver
pub struct ProviderCluster {
    name: String,
    nodes: AtomicI32,
    // Guards the latest-snapshot field; the window has its own locking
    latest: Mutex<Option<Metrics>>,
    window: MetricsWindow,
    driver: Arc<dyn ProviderDriver>,
}

impl ProviderCluster {
    pub fn new(
        name: impl Into<String>,
        nodes: i32,
        window_capacity: usize,
        driver: Arc<dyn ProviderDriver>,
    ) -> Self {
        Self {
            name: name.into(),
            nodes: AtomicI32::new(nodes),
            latest: Mutex::new(None),
            window: MetricsWindow::new(window_capacity),
            driver,
        }
    }
}

#[async_trait]
impl ManagedCluster for ProviderCluster {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> i32 {
        self.nodes.load(Ordering::SeqCst)
    }

    fn record_snapshot(&self, snapshot: Metrics) {
        let mut latest = self.latest.lock().expect("cluster status lock poisoned");
        self.nodes.store(snapshot.number_of_nodes, Ordering::SeqCst);
        self.window.append(snapshot.clone());
        *latest = Some(snapshot);
    }

    fn latest_snapshot(&self) -> Option<Metrics> {
        self.latest
            .lock()
            .expect("cluster status lock poisoned")
            .clone()
    }

    fn window(&self) -> &MetricsWindow {
        &self.window
    }

    async fn scale(&self, delta: i32) -> Result<()> {
        info!(cluster = %self.name, delta, "Forwarding scale request to provider");
        self.driver.scale(&self.name, delta).await?;
        self.nodes.fetch_add(delta, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LogOnlyDriver;

    fn snapshot_for(cluster: &str, nodes: i32) -> Metrics {
        Metrics {
            cluster_name: cluster.to_string(),
            number_of_nodes: nodes,
            ..Default::default()
        }
    }

    #[test]
    fn test_record_snapshot_updates_latest_and_window() {
        let driver = Arc::new(LogOnlyDriver::new());
        let cluster = ProviderCluster::new("c1", 3, 8, driver);

        assert!(cluster.latest_snapshot().is_none());

        cluster.record_snapshot(snapshot_for("c1", 5));
        cluster.record_snapshot(snapshot_for("c1", 6));

        assert_eq!(cluster.nodes(), 6);
        assert_eq!(cluster.latest_snapshot().unwrap().number_of_nodes, 6);
        assert_eq!(cluster.window().len(), 2);
    }

    #[tokio::test]
    async fn test_scale_goes_through_driver() {
        let driver = Arc::new(LogOnlyDriver::new());
        let cluster = ProviderCluster::new("c1", 10, 8, driver.clone());

        cluster.scale(4).await.unwrap();
        cluster.scale(-2).await.unwrap();

        assert_eq!(cluster.nodes(), 12);
        assert_eq!(driver.requests(), vec!["scale c1 4", "scale c1 -2"]);
    }
}
