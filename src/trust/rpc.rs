//! Production chain gateway: Solana JSON-RPC nodes plus an optional enriched indexer.
//!
//! RPC calls walk the configured endpoint list in order. Any transport failure,
//! non-success status or RPC error moves on to the next endpoint; an endpoint
//! that failed is not retried within the same call.

use crate::trust::gateway::{ChainGateway, GatewayError};
use crate::trust::rate_limit::RequestThrottle;
use crate::trust::types::{ChainTransaction, IndexedTransaction, SignatureInfo, TrustConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use nonempty::NonEmpty;
use reqwest::Client;
use serde_json::json;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// One RPC node.
pub struct RpcEndpoint {
    pub url: String,
    client: Arc<RpcClient>,
}

impl RpcEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        let client = Arc::new(RpcClient::new_with_timeout_and_commitment(
            url.clone(),
            timeout,
            CommitmentConfig::confirmed(),
        ));
        Self { url, client }
    }
}

/// Enriched transaction indexer (Helius-style `/v0/addresses/{address}/transactions`).
pub struct EnrichedIndexer {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl EnrichedIndexer {
    pub fn new(http_client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    #[instrument(skip(self))]
    async fn transactions(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<IndexedTransaction>, GatewayError> {
        const METHOD: &str = "indexer.transactions";
        let url = format!("{}/v0/addresses/{}/transactions", self.base_url, address);

        let mut query: Vec<(&str, String)> = vec![
            ("api-key", self.api_key.clone()),
            ("limit", limit.to_string()),
        ];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Indexer request failed");
                GatewayError::Unavailable { method: METHOD, attempts: 1 }
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Indexer returned an error status");
            return Err(GatewayError::Unavailable { method: METHOD, attempts: 1 });
        }

        let transactions: Vec<IndexedTransaction> =
            response.json().await.map_err(|e| GatewayError::Decode {
                method: METHOD,
                reason: e.to_string(),
            })?;

        debug!("Indexer returned {} transactions", transactions.len());
        Ok(transactions)
    }
}

/// Gateway over an ordered RPC endpoint list and an optional indexer.
pub struct SolanaGateway {
    endpoints: NonEmpty<RpcEndpoint>,
    indexer: Option<EnrichedIndexer>,
    throttle: Arc<RequestThrottle>,
}

impl SolanaGateway {
    pub fn new(
        endpoints: NonEmpty<RpcEndpoint>,
        indexer: Option<EnrichedIndexer>,
        throttle: Arc<RequestThrottle>,
    ) -> Self {
        Self {
            endpoints,
            indexer,
            throttle,
        }
    }

    /// Build the gateway described by a configuration.
    pub fn from_config(config: &TrustConfig, http_client: Client) -> Result<Self> {
        let timeout = Duration::from_secs(config.rpc_timeout_seconds);
        let endpoints = config
            .rpc_endpoints
            .iter()
            .map(|url| RpcEndpoint::new(url.clone(), timeout))
            .collect::<Vec<_>>();
        let endpoints = NonEmpty::from_vec(endpoints)
            .ok_or_else(|| anyhow!("at least one RPC endpoint is required"))?;

        let indexer = config.indexer_api_key.as_ref().map(|key| {
            EnrichedIndexer::new(http_client.clone(), config.indexer_base_url.clone(), key.clone())
        });

        let throttle = Arc::new(RequestThrottle::new(config.rate_limit_requests_per_second));

        debug!(
            "Gateway configured with {} RPC endpoint(s), indexer {}",
            endpoints.len(),
            if indexer.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self::new(endpoints, indexer, throttle))
    }

    pub fn endpoint_urls(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.url.as_str()).collect()
    }

    /// Run `call` against each endpoint in order until one succeeds.
    async fn with_fallback<T, F, Fut>(&self, method: &'static str, call: F) -> Result<T, GatewayError>
    where
        F: Fn(Arc<RpcClient>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        for endpoint in self.endpoints.iter() {
            self.throttle.acquire().await;
            match call(endpoint.client.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(endpoint = %endpoint.url, method, error = %e, "RPC call failed, trying next endpoint");
                }
            }
        }

        Err(GatewayError::Unavailable {
            method,
            attempts: self.endpoints.len(),
        })
    }
}

fn parse_pubkey(address: &str) -> Result<Pubkey, GatewayError> {
    Pubkey::from_str(address.trim()).map_err(|_| GatewayError::InvalidAddress(address.to_string()))
}

fn parse_signature(signature: &str) -> Result<Signature, GatewayError> {
    Signature::from_str(signature.trim())
        .map_err(|_| GatewayError::InvalidAddress(signature.to_string()))
}

/// Check that a string is a valid base58 Solana public key.
pub fn is_valid_address(address: &str) -> bool {
    Pubkey::from_str(address.trim()).is_ok()
}

#[async_trait]
impl ChainGateway for SolanaGateway {
    fn has_indexer(&self) -> bool {
        self.indexer.is_some()
    }

    #[instrument(skip(self))]
    async fn signatures_for_address(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<SignatureInfo>, GatewayError> {
        let pubkey = parse_pubkey(address)?;
        let before = before.map(parse_signature).transpose()?;

        let statuses = self
            .with_fallback("getSignaturesForAddress", move |rpc| {
                let config = GetConfirmedSignaturesForAddress2Config {
                    before: before.clone(),
                    until: None,
                    limit: Some(limit),
                    commitment: Some(CommitmentConfig::confirmed()),
                };
                async move { rpc.get_signatures_for_address_with_config(&pubkey, config).await }
            })
            .await?;

        Ok(statuses
            .into_iter()
            .map(|status| SignatureInfo {
                signature: status.signature,
                block_time: status.block_time,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn transaction(&self, signature: &str) -> Result<Option<ChainTransaction>, GatewayError> {
        let signature = parse_signature(signature)?.to_string();
        let params = json!([
            signature,
            {
                "encoding": UiTransactionEncoding::JsonParsed,
                "commitment": "confirmed",
                "maxSupportedTransactionVersion": 0
            }
        ]);

        self.with_fallback("getTransaction", move |rpc| {
            let params = params.clone();
            async move {
                rpc.send::<Option<ChainTransaction>>(RpcRequest::GetTransaction, params)
                    .await
            }
        })
        .await
    }

    async fn indexed_transactions(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<IndexedTransaction>, GatewayError> {
        let indexer = self.indexer.as_ref().ok_or(GatewayError::IndexerNotConfigured)?;
        self.throttle.acquire().await;
        indexer.transactions(address, limit, before).await
    }
}

/// Shared HTTP client with the configured timeout.
pub fn build_http_client(config: &TrustConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.rpc_timeout_seconds))
        .build()
        .context("Failed to build HTTP client")
}
