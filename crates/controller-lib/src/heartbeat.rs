//! Heartbeat ingestion
//!
//! Long-lived UDP receive loop that demultiplexes inbound telemetry. Known
//! clusters get the snapshot recorded; a heartbeat from a cluster not in
//! the pool triggers the adoption path: if the provisioning store knows the
//! name, a fresh cluster and autoscaler pair is built and registered,
//! otherwise the provider is told to release whatever the unknown reporter
//! holds.

use crate::autoscaler::{Autoscaler, DEFAULT_TICK};
use crate::cluster::{ManagedCluster, ProviderCluster};
use crate::models::Metrics;
use crate::observability::ControllerMetrics;
use crate::policy::{FeedbackSink, MemoryPolicy, PolicyConfig};
use crate::pool::{ClusterPool, PoolEntry};
use crate::proto;
use crate::provider::ProviderDriver;
use crate::store::ProvisionStore;
use crate::window::DEFAULT_WINDOW_CAPACITY;
use anyhow::{Context, Result};
use prost::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const MAX_DATAGRAM: usize = 4096;

/// Settings applied to clusters adopted through the ingestion path
#[derive(Debug, Clone)]
pub struct MonitoringDefaults {
    pub tick: Duration,
    pub allow_downscale: bool,
    pub window_capacity: usize,
    pub policy: PolicyConfig,
}

impl Default for MonitoringDefaults {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            allow_downscale: false,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            policy: PolicyConfig::default(),
        }
    }
}

/// Owns the inbound socket and everything needed to route or adopt a
/// reporting cluster. Instances are independent; tests run several at once.
pub struct HeartbeatReceiver {
    socket: UdpSocket,
    pool: Arc<ClusterPool>,
    store: Arc<dyn ProvisionStore>,
    driver: Arc<dyn ProviderDriver>,
    feedback: Arc<dyn FeedbackSink>,
    defaults: MonitoringDefaults,
}

impl HeartbeatReceiver {
    pub async fn bind(
        addr: SocketAddr,
        pool: Arc<ClusterPool>,
        store: Arc<dyn ProvisionStore>,
        driver: Arc<dyn ProviderDriver>,
        feedback: Arc<dyn FeedbackSink>,
        defaults: MonitoringDefaults,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Failed to bind heartbeat socket on {addr}"))?;
        Ok(Self {
            socket,
            pool,
            store,
            driver,
            feedback,
            defaults,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .context("Heartbeat socket has no local address")
    }

    /// Receive loop. Exits cleanly when the shutdown signal fires; any
    /// other receive error is treated as transient.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(addr = ?self.socket.local_addr().ok(), "Starting heartbeat receiver");
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, _)) => self.handle_datagram(&buf[..len]).await,
                        Err(e) => {
                            warn!(error = %e, "Heartbeat socket read failed");
                            continue;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("Closing heartbeat receiver");
                    break;
                }
            }
        }
    }

    async fn handle_datagram(&self, payload: &[u8]) {
        let heartbeat = match proto::Heartbeat::decode(payload) {
            Ok(hb) => hb,
            Err(e) => {
                ControllerMetrics::new().inc_decode_failures();
                warn!(error = %e, "Dropping malformed heartbeat");
                return;
            }
        };

        let snapshot = Metrics::from(heartbeat);
        ControllerMetrics::new().inc_heartbeats_received();

        if let Some(entry) = self.pool.get(&snapshot.cluster_name) {
            debug!(cluster = %snapshot.cluster_name, "Metrics updated");
            entry.cluster.record_snapshot(snapshot);
            return;
        }

        info!(
            cluster = %snapshot.cluster_name,
            "Heartbeat from a cluster not in the pool"
        );
        self.adopt_cluster(snapshot).await;
    }

    /// Adoption path for a reporting cluster the pool does not know
    async fn adopt_cluster(&self, snapshot: Metrics) {
        let name = snapshot.cluster_name.clone();

        let provisioned = match self.store.cluster_was_provisioned(&name).await {
            Ok(provisioned) => provisioned,
            Err(e) => {
                warn!(cluster = %name, error = %e, "Provision-store lookup failed, skipping heartbeat");
                return;
            }
        };

        if !provisioned {
            info!(cluster = %name, "Unrecognized cluster, releasing its resources");
            if let Err(e) = self.driver.release_resources(&name).await {
                warn!(cluster = %name, error = %e, "Resource release failed");
            }
            return;
        }

        let attached = match self.driver.attach_existing(&name).await {
            Ok(attached) => attached,
            Err(e) => {
                warn!(cluster = %name, error = %e, "Could not attach to existing cluster");
                return;
            }
        };

        let cluster: Arc<dyn ManagedCluster> = Arc::new(ProviderCluster::new(
            &attached.name,
            attached.nodes,
            self.defaults.window_capacity,
            self.driver.clone(),
        ));
        let policy = Box::new(MemoryPolicy::new(
            self.defaults.policy.clone(),
            self.feedback.clone(),
        ));
        let autoscaler = Arc::new(Autoscaler::new(
            cluster.clone(),
            policy,
            self.defaults.tick,
            self.defaults.allow_downscale,
        ));

        let entry = PoolEntry {
            cluster: cluster.clone(),
            autoscaler: autoscaler.clone(),
        };
        match self.pool.insert_if_absent(&name, entry) {
            Ok(()) => {
                cluster.record_snapshot(snapshot);
                autoscaler.start();
                ControllerMetrics::new().set_clusters_monitored(self.pool.len() as i64);
                info!(cluster = %name, "Added cluster to the pool");
            }
            Err(existing) => {
                // Lost a concurrent adoption race; the fresh pair was never
                // started so it can simply be dropped
                existing.cluster.record_snapshot(snapshot);
            }
        }
    }
}
