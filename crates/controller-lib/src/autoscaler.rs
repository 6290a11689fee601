//! Per-cluster autoscaling control loop
//!
//! One autoscaler binds one managed cluster to one policy instance and
//! applies the policy on a fixed tick. Negative deltas are forwarded only
//! when downscaling is permitted for this instance; positive deltas always
//! go through. Stopping is one-shot and idempotent.

use crate::cluster::ManagedCluster;
use crate::observability::ControllerMetrics;
use crate::policy::ScalingPolicy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default interval between policy applications
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

pub struct Autoscaler {
    cluster: Arc<dyn ManagedCluster>,
    policy: tokio::sync::Mutex<Box<dyn ScalingPolicy>>,
    tick: Duration,
    allow_downscale: bool,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    started: AtomicBool,
    stopped: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Autoscaler {
    pub fn new(
        cluster: Arc<dyn ManagedCluster>,
        policy: Box<dyn ScalingPolicy>,
        tick: Duration,
        allow_downscale: bool,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            cluster,
            policy: tokio::sync::Mutex::new(policy),
            tick,
            allow_downscale,
            shutdown_tx,
            shutdown_rx,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    pub fn allow_downscale(&self) -> bool {
        self.allow_downscale
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !self.stopped.load(Ordering::SeqCst)
    }

    /// Spawn the control loop. Calling twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(
            cluster = %self.cluster.name(),
            tick_secs = self.tick.as_secs(),
            allow_downscale = self.allow_downscale,
            "Starting autoscaler loop"
        );
        let this = self.clone();
        let shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(this.run(shutdown));
        *self.task.lock().expect("autoscaler task lock poisoned") = Some(handle);
    }

    /// Signal the control loop to exit at the next tick boundary.
    ///
    /// Idempotent: the underlying signal fires once and later calls are
    /// no-ops, never a panic. A stopped autoscaler is not restartable.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(cluster = %self.cluster.name(), "Stopping autoscaler");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the control-loop task to exit after `stop`
    pub async fn join(&self) {
        let handle = self
            .task
            .lock()
            .expect("autoscaler task lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.apply_once().await;
                }
                _ = shutdown.changed() => {
                    info!(cluster = %self.cluster.name(), "Autoscaler loop closed");
                    break;
                }
            }
        }
    }

    /// One control-loop tick: apply the policy and forward sign-permitted
    /// non-zero deltas to the cluster
    async fn apply_once(&self) {
        let delta = {
            let mut policy = self.policy.lock().await;
            policy.apply(self.cluster.window()).await
        };

        if delta == 0 {
            return;
        }

        if delta < 0 && !self.allow_downscale {
            debug!(
                cluster = %self.cluster.name(),
                delta,
                "Downscaling not permitted, ignoring negative delta"
            );
            return;
        }

        ControllerMetrics::new().inc_scale_operations();
        if let Err(e) = self.cluster.scale(delta).await {
            warn!(cluster = %self.cluster.name(), delta, error = %e, "Scale request failed");
        }
    }
}
