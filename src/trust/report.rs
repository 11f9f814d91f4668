//! Third-party token report and base score provider.

use crate::trust::types::{TokenReport, TrustConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, instrument};

/// Source of the per-token report (`creator`, holders, risks, ...).
#[async_trait]
pub trait TokenReportSource: Send + Sync {
    async fn token_report(&self, mint: &str) -> Result<TokenReport>;
}

/// Source of the 0–100 base trust score.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    async fn base_score(&self, mint: &str) -> Result<u8>;
}

#[derive(Debug, Deserialize)]
struct ReportSummary {
    score_normalised: Option<i64>,
}

/// rugcheck.xyz client.
pub struct RugcheckClient {
    http_client: Client,
    base_url: String,
    retry_attempts: usize,
}

impl RugcheckClient {
    pub fn new(http_client: Client, config: &TrustConfig) -> Self {
        Self {
            http_client,
            base_url: config.report_api_url.trim_end_matches('/').to_string(),
            retry_attempts: config.report_retry_attempts,
        }
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(200)
            .max_delay(Duration::from_secs(3))
            .take(self.retry_attempts)
    }

    async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .context("Failed to reach report provider")?;

        if !response.status().is_success() {
            return Err(anyhow!("Report provider returned {}", response.status()));
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse report provider response")
    }
}

#[async_trait]
impl TokenReportSource for RugcheckClient {
    #[instrument(skip(self))]
    async fn token_report(&self, mint: &str) -> Result<TokenReport> {
        let url = format!("{}/tokens/{}/report", self.base_url, mint);

        let report = Retry::spawn(self.retry_strategy(), || self.get_json::<TokenReport>(&url)).await?;
        debug!(creator = ?report.creator, "Fetched token report");
        Ok(report)
    }
}

#[async_trait]
impl ScoreSource for RugcheckClient {
    #[instrument(skip(self))]
    async fn base_score(&self, mint: &str) -> Result<u8> {
        let url = format!("{}/tokens/{}/report/summary", self.base_url, mint);

        let summary =
            Retry::spawn(self.retry_strategy(), || self.get_json::<ReportSummary>(&url)).await?;
        let risk = summary
            .score_normalised
            .ok_or_else(|| anyhow!("Report summary has no normalised score"))?;

        Ok(base_score_from_risk(risk))
    }
}

/// Normalised risk (0 safe .. 100 dangerous) to base trust (0..100).
pub fn base_score_from_risk(risk: i64) -> u8 {
    (100 - risk.clamp(0, 100)) as u8
}
