//! Fleet controller - autoscaling control plane for compute clusters
//!
//! Ingests per-cluster telemetry over UDP, runs one autoscaling control
//! loop per managed cluster, and forwards scale decisions to the cluster
//! provider. Feedback around each scaling decision is exported to an
//! external learning service.

use anyhow::Result;
use controller_lib::{
    provider::LogOnlyDriver, ClusterPool, FileProvisionStore, HeartbeatReceiver,
    MonitoringDefaults, PolicyConfig, PredictorClient, PredictorConfig, Wal,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting fleet-controller");

    let config = config::ControllerConfig::load()?;
    info!(heartbeat_addr = %config.heartbeat_addr, "Controller configured");

    // Recover job state before accepting any work
    let ledger = Wal::open(&config.wal_path)?.restore()?;
    info!(
        pending_jobs = ledger.pending.len(),
        "Job ledger restored from WAL"
    );

    let pool = Arc::new(ClusterPool::new());
    let store = Arc::new(FileProvisionStore::new(&config.provisioned_path));
    // Cloud-specific drivers plug in here; the log-only driver records
    // provider requests until one is configured
    let driver = Arc::new(LogOnlyDriver::new());
    let predictor = PredictorClient::new(PredictorConfig {
        endpoint: config.predictor_endpoint.clone(),
        ..PredictorConfig::default()
    });

    let defaults = MonitoringDefaults {
        tick: Duration::from_secs(config.tick_secs),
        allow_downscale: config.allow_downscale,
        window_capacity: config.window_capacity,
        policy: PolicyConfig {
            step_max: config.policy_step_max,
            countdown: config.policy_countdown,
            upper_bound: config.policy_upper_bound,
            lower_bound: config.policy_lower_bound,
        },
    };

    let receiver = HeartbeatReceiver::bind(
        config.heartbeat_addr.parse()?,
        pool.clone(),
        store,
        driver,
        Arc::new(predictor),
        defaults,
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ingest = tokio::spawn(receiver.run(shutdown_rx));

    let app_state = Arc::new(api::AppState::new(pool.clone()));
    app_state.set_ready(true);
    tokio::spawn(api::serve(config.api_port, app_state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    shutdown_tx.send(true)?;
    pool.stop_all();
    ingest.await?;

    Ok(())
}
