//! Cluster pool
//!
//! Concurrent directory of the clusters currently under monitoring. One
//! lookup per inbound heartbeat runs against occasional inserts for newly
//! discovered clusters, so entries live in a sharded concurrent map.

use crate::autoscaler::Autoscaler;
use crate::cluster::ManagedCluster;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// A monitored cluster and its control loop
#[derive(Clone)]
pub struct PoolEntry {
    pub cluster: Arc<dyn ManagedCluster>,
    pub autoscaler: Arc<Autoscaler>,
}

impl std::fmt::Debug for PoolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolEntry")
            .field("cluster", &self.cluster.name())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ClusterPool {
    clusters: DashMap<String, PoolEntry>,
}

impl ClusterPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking lookup; a returned entry is always fully formed
    pub fn get(&self, name: &str) -> Option<PoolEntry> {
        self.clusters.get(name).map(|e| e.value().clone())
    }

    /// Register `entry` under `name` unless the key is already present.
    ///
    /// Atomic check-then-act: when two ingestion paths race on the same
    /// previously-unknown cluster, exactly one pair wins and the loser gets
    /// the winner's entry back.
    pub fn insert_if_absent(&self, name: &str, entry: PoolEntry) -> Result<(), PoolEntry> {
        match self.clusters.entry(name.to_string()) {
            Entry::Occupied(existing) => Err(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Remove a cluster from monitoring, stopping its control loop
    pub fn remove(&self, name: &str) -> Option<PoolEntry> {
        let (_, entry) = self.clusters.remove(name)?;
        entry.autoscaler.stop();
        info!(cluster = %name, "Removed cluster from the pool");
        Some(entry)
    }

    /// Stop every control loop; used at process shutdown
    pub fn stop_all(&self) {
        for entry in self.clusters.iter() {
            entry.value().autoscaler.stop();
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.clusters.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoscaler::DEFAULT_TICK;
    use crate::cluster::ProviderCluster;
    use crate::policy::{MemoryPolicy, PolicyConfig};
    use crate::provider::LogOnlyDriver;
    use crate::proto;
    use anyhow::Result;
    use async_trait::async_trait;

    struct NullSink;

    #[async_trait]
    impl crate::policy::FeedbackSink for NullSink {
        async fn export(&self, _record: proto::FeedbackRecord) -> Result<()> {
            Ok(())
        }
    }

    fn entry_for(name: &str) -> PoolEntry {
        let driver = Arc::new(LogOnlyDriver::new());
        let cluster: Arc<dyn ManagedCluster> =
            Arc::new(ProviderCluster::new(name, 5, 8, driver));
        let policy = Box::new(MemoryPolicy::new(PolicyConfig::default(), Arc::new(NullSink)));
        let autoscaler = Arc::new(Autoscaler::new(cluster.clone(), policy, DEFAULT_TICK, false));
        PoolEntry {
            cluster,
            autoscaler,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let pool = ClusterPool::new();
        assert!(pool.get("c1").is_none());

        pool.insert_if_absent("c1", entry_for("c1")).unwrap();
        let entry = pool.get("c1").unwrap();
        assert_eq!(entry.cluster.name(), "c1");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_insert_if_absent_keeps_first_entry() {
        let pool = ClusterPool::new();
        pool.insert_if_absent("c1", entry_for("c1")).unwrap();

        let lost = pool.insert_if_absent("c1", entry_for("c1"));
        assert!(lost.is_err());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_stops_the_autoscaler() {
        let pool = ClusterPool::new();
        pool.insert_if_absent("c1", entry_for("c1")).unwrap();

        let entry = pool.remove("c1").unwrap();
        assert!(!entry.autoscaler.is_running());
        assert!(pool.get("c1").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_lookups_with_insert() {
        let pool = Arc::new(ClusterPool::new());

        let readers: Vec<_> = (0..16)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        if let Some(entry) = pool.get("c1") {
                            // Never a torn entry: both halves resolve
                            assert_eq!(entry.cluster.name(), "c1");
                            assert!(!entry.autoscaler.allow_downscale());
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let writer = {
            let pool = pool.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                pool.insert_if_absent("c1", entry_for("c1")).unwrap();
            })
        };

        writer.await.unwrap();
        for r in readers {
            r.await.unwrap();
        }
        assert_eq!(pool.len(), 1);
    }
}
