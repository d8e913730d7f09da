// src/check/checker.rs
use super::status::{classify_status, CheckRecord};
use crate::config::CheckConfig;
use crate::metrics::MetricsCollector;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct SiteChecker {
    client: Client,
    concurrency: usize,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SiteChecker {
    pub fn new(
        config: &CheckConfig,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<Self, CheckError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
            metrics,
        })
    }

    /// Check every site. Results come back in the order of `sites`.
    pub async fn check_all(&self, sites: &[String]) -> Vec<CheckRecord> {
        let checks: Vec<_> = sites.iter().map(|url| self.check_site(url)).collect();
        stream::iter(checks)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn check_site(&self, url: &str) -> CheckRecord {
        let start = Instant::now();
        let result = self.client.get(url).send().await;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let record = match result {
            Ok(response) => {
                let code = response.status().as_u16();
                debug!(code, response_time_ms, "Received response");
                classify_status(url, code, response_time_ms)
            }
            Err(e) => {
                warn!("Request failed: {}", e);
                CheckRecord::failed(url, e.to_string(), response_time_ms)
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_check(&record);
        }

        record
    }
}
