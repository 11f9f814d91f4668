//! Real deployer resolution.
//!
//! Launch platforms report their own mint authority as a token's "creator".
//! The resolver works back to the wallet that actually initiated the creation
//! transaction. Strategies run strictly in order and the first classifier-passing
//! address wins:
//!
//! 1. the reported creator itself, when it is a user wallet and the mint is not
//!    platform-suffixed (no network calls);
//! 2. fee payer of the oldest indexed transaction of the mint;
//! 3. oldest raw transaction of the mint (paginated signatures), scanned for
//!    a signer, then an inner lamport transfer source, then a `creator: <address>` log line.
//!
//! When nothing qualifies the reported creator is returned unchanged. A relayer
//! paying fees on behalf of the real initiator will be mis-attributed.

use crate::trust::classifier::AddressClassifier;
use crate::trust::gateway::{indexed_history, oldest_signature, ChainGateway};
use crate::trust::types::{ChainTransaction, DeployerSource, ResolvedDeployer, TrustConfig};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Resolves the human deployer of a token mint.
pub struct DeployerResolver {
    gateway: Arc<dyn ChainGateway>,
    classifier: Arc<AddressClassifier>,
    signature_batch_size: usize,
    max_signature_batches: usize,
    indexer_page_size: usize,
    max_indexer_transactions: usize,
}

impl DeployerResolver {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        classifier: Arc<AddressClassifier>,
        config: &TrustConfig,
    ) -> Self {
        Self {
            gateway,
            classifier,
            signature_batch_size: config.signature_batch_size,
            max_signature_batches: config.max_signature_batches,
            indexer_page_size: config.indexer_page_size,
            max_indexer_transactions: config.max_indexer_transactions,
        }
    }

    /// Best-guess deployer for `mint`. Never fails.
    #[instrument(skip(self))]
    pub async fn resolve_deployer(&self, mint: &str, reported_creator: &str) -> ResolvedDeployer {
        let reported_is_user = !self.classifier.is_known_non_user(reported_creator);
        if reported_is_user && !self.classifier.is_platform_mint(mint) {
            debug!("Reported creator is a user wallet, no lookup needed");
            return ResolvedDeployer::new(reported_creator, DeployerSource::DirectReport);
        }

        if mint.trim().is_empty() {
            return ResolvedDeployer::new(reported_creator, DeployerSource::FallbackToReported);
        }

        if let Some(fee_payer) = self.indexer_fee_payer(mint).await {
            info!(deployer = %fee_payer, "Resolved deployer from indexer fee payer");
            return ResolvedDeployer::new(fee_payer, DeployerSource::IndexerFeePayer);
        }

        if let Some(resolved) = self.from_oldest_transaction(mint).await {
            info!(deployer = %resolved.address, source = resolved.source.as_str(), "Resolved deployer from RPC");
            return resolved;
        }

        info!("No qualifying deployer found, keeping reported creator");
        ResolvedDeployer::new(reported_creator, DeployerSource::FallbackToReported)
    }

    /// Fee payer of the mint's oldest indexed transaction, if it qualifies.
    async fn indexer_fee_payer(&self, mint: &str) -> Option<String> {
        if !self.gateway.has_indexer() {
            return None;
        }

        let history = match indexed_history(
            self.gateway.as_ref(),
            mint,
            self.indexer_page_size,
            self.max_indexer_transactions,
        )
        .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Indexer unavailable for deployer lookup");
                return None;
            }
        };

        // Hitting the bound means older transactions exist that were not fetched.
        if history.is_empty() || history.len() >= self.max_indexer_transactions {
            debug!(fetched = history.len(), "Indexer history does not reach the creation transaction");
            return None;
        }

        let fee_payer = history.first()?.fee_payer.as_deref()?;
        if self.classifier.is_known_non_user(fee_payer) {
            debug!(fee_payer, "Indexer fee payer is a known non-user address");
            return None;
        }
        Some(fee_payer.to_string())
    }

    /// Scan the mint's oldest raw transaction.
    async fn from_oldest_transaction(&self, mint: &str) -> Option<ResolvedDeployer> {
        let oldest = oldest_signature(
            self.gateway.as_ref(),
            mint,
            self.signature_batch_size,
            self.max_signature_batches,
        )
        .await?;

        let transaction = match self.gateway.transaction(&oldest.signature).await {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                debug!(signature = %oldest.signature, "Oldest transaction not found");
                return None;
            }
            Err(e) => {
                warn!(signature = %oldest.signature, error = %e, "Failed to fetch oldest transaction");
                return None;
            }
        };

        self.scan_transaction(&transaction)
    }

    /// Signer, then inner lamport transfer source, then log line.
    pub fn scan_transaction(&self, transaction: &ChainTransaction) -> Option<ResolvedDeployer> {
        if let Some(signer) = transaction
            .signers()
            .find(|signer| !self.classifier.is_known_non_user(signer))
        {
            return Some(ResolvedDeployer::new(signer, DeployerSource::RpcSigner));
        }

        if let Some(transfer) = transaction
            .inner_native_transfers()
            .into_iter()
            .find(|transfer| !self.classifier.is_known_non_user(&transfer.source))
        {
            return Some(ResolvedDeployer::new(
                transfer.source,
                DeployerSource::RpcInnerInstruction,
            ));
        }

        creators_in_logs(transaction.log_messages())
            .into_iter()
            .find(|creator| !self.classifier.is_known_non_user(creator))
            .map(|creator| ResolvedDeployer::new(creator, DeployerSource::RpcLogParse))
    }
}

/// Every `creator: <address>` mention in program logs, in order.
pub fn creators_in_logs(logs: &[String]) -> Vec<String> {
    const MARKER: &str = "creator:";

    let mut creators = Vec::new();
    for line in logs {
        let lower = line.to_ascii_lowercase();
        let mut offset = 0;
        while let Some(found) = lower[offset..].find(MARKER) {
            let start = offset + found + MARKER.len();
            let candidate: String = line[start..]
                .trim_start_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
                .chars()
                .take_while(|c| is_base58_char(*c))
                .collect();

            if (32..=44).contains(&candidate.len()) {
                creators.push(candidate);
            }
            offset = start;
        }
    }
    creators
}

fn is_base58_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}
