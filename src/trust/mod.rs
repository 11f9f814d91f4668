//! Deployer trust lookup.
//!
//! Resolves the wallet that actually launched a token, traces where that
//! wallet's first funds came from, lists the other tokens it launched and
//! merges everything with a third-party report into one [`ResultRecord`].

pub mod types;
pub mod classifier;
pub mod gateway;
pub mod rate_limit;
pub mod rpc;
pub mod resolver;
pub mod provenance;
pub mod history;
pub mod report;
pub mod scoring;
pub mod recent;
pub mod aggregator;

// Re-export main public types and the aggregator
pub use aggregator::SignalAggregator;
pub use types::{
    CreatedToken, DeployerSource, ProvenanceRecord, ResolvedDeployer, ResultRecord, TrustConfig,
};

// Re-export other key components for advanced usage
pub use classifier::{AddressClassifier, DenyList};
pub use gateway::{ChainGateway, GatewayError};
pub use history::DeployerTokenHistory;
pub use provenance::ProvenanceAnalyzer;
pub use rate_limit::RequestThrottle;
pub use recent::{RecentCheck, RecentChecks};
pub use report::{RugcheckClient, ScoreSource, TokenReportSource};
pub use resolver::DeployerResolver;
pub use rpc::SolanaGateway;
pub use scoring::{TrustScore, TrustTier};

use std::sync::Arc;

/// Builder for a fully wired [`SignalAggregator`] with sensible defaults.
pub struct TrustCheckBuilder {
    config: TrustConfig,
}

impl TrustCheckBuilder {
    pub fn new() -> Self {
        Self {
            config: TrustConfig::default(),
        }
    }

    /// Start from an existing configuration, e.g. [`TrustConfig::from_env`].
    pub fn from_config(config: TrustConfig) -> Self {
        Self { config }
    }

    /// Set the RPC endpoints. An empty list keeps the current ones.
    pub fn with_rpc_endpoints(mut self, endpoints: Vec<String>) -> Self {
        if !endpoints.is_empty() {
            self.config.rpc_endpoints = endpoints;
        }
        self
    }

    pub fn with_indexer_api_key(mut self, api_key: Option<String>) -> Self {
        if api_key.is_some() {
            self.config.indexer_api_key = api_key;
        }
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.config.rate_limit_requests_per_second = requests_per_second;
        self
    }

    /// Per-request network timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.rpc_timeout_seconds = seconds;
        self
    }

    /// Extra non-user addresses on top of the built-in table.
    pub fn with_denylist(mut self, addresses: Vec<String>) -> Self {
        self.config.denylist = self.config.denylist.with_addresses(addresses);
        self
    }

    pub fn with_recent_checks_capacity(mut self, capacity: usize) -> Self {
        self.config.recent_checks_capacity = capacity;
        self
    }

    pub fn build_config(self) -> TrustConfig {
        self.config
    }

    /// Build the aggregator against the live chain and report provider.
    pub fn build(self) -> anyhow::Result<SignalAggregator> {
        let http_client = rpc::build_http_client(&self.config)?;
        let gateway = Arc::new(SolanaGateway::from_config(&self.config, http_client.clone())?);
        let reports = Arc::new(RugcheckClient::new(http_client, &self.config));

        Ok(SignalAggregator::new(
            gateway,
            reports.clone(),
            reports,
            &self.config,
        ))
    }
}

impl Default for TrustCheckBuilder {
    fn default() -> Self {
        Self::new()
    }
}
