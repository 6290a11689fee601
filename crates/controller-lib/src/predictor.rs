//! gRPC client for the learning service
//!
//! Exports completed feedback records over a lazily-established channel.
//! Connect and request timeouts are bounded so an unreachable service can
//! only stall a control-loop tick for a bounded interval; callers treat
//! export failures as recoverable.

use crate::policy::FeedbackSink;
use crate::proto::{self, LearningServiceClient};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};

/// Configuration for the learning-service client
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Endpoint URL, e.g. "http://learning-service:9090"
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://learning-service:9090".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Client handle shared by every policy instance.
///
/// Clones share one underlying channel; the channel is dialed on first use
/// and dropped on failure so the next export retries the connection.
#[derive(Clone)]
pub struct PredictorClient {
    config: PredictorConfig,
    channel: Arc<RwLock<Option<Channel>>>,
}

impl PredictorClient {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            config,
            channel: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self::new(PredictorConfig {
            endpoint: endpoint.into(),
            ..PredictorConfig::default()
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn get_or_connect(&self) -> Result<Channel> {
        if let Some(channel) = self.channel.read().await.clone() {
            return Ok(channel);
        }

        let mut slot = self.channel.write().await;
        // Another export may have connected while we waited for the lock
        if let Some(channel) = slot.clone() {
            return Ok(channel);
        }

        debug!(endpoint = %self.config.endpoint, "Dialing learning service");
        let channel = Endpoint::from_shared(self.config.endpoint.clone())
            .context("Invalid learning-service endpoint")?
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .connect()
            .await
            .context("Failed to connect to learning service")?;

        *slot = Some(channel.clone());
        Ok(channel)
    }

    async fn reset_channel(&self) {
        *self.channel.write().await = None;
    }
}

#[async_trait]
impl FeedbackSink for PredictorClient {
    async fn export(&self, record: proto::FeedbackRecord) -> Result<()> {
        let channel = self.get_or_connect().await?;
        let mut client = LearningServiceClient::new(channel);

        let response = match client.collect_feedback(record).await {
            Ok(response) => response.into_inner(),
            Err(status) => {
                self.reset_channel().await;
                warn!(error = %status, "Feedback export failed");
                bail!("learning service call failed: {status}");
            }
        };

        if !response.success {
            bail!("learning service rejected the record: {}", response.message);
        }
        Ok(())
    }
}
