//! Chain data gateway contract and the pagination helpers built on it.
//!
//! The resolver, provenance analyzer and token history only ever talk to a
//! [`ChainGateway`]. The production implementation lives in `rpc.rs`; tests
//! substitute stubs.

use crate::trust::types::{ChainTransaction, IndexedTransaction, SignatureInfo};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures surfaced by a gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Every configured endpoint failed for this call.
    #[error("gateway unavailable: all {attempts} endpoint(s) failed for {method}")]
    Unavailable { method: &'static str, attempts: usize },

    #[error("no enriched indexer configured")]
    IndexerNotConfigured,

    #[error("invalid address or signature: {0}")]
    InvalidAddress(String),

    #[error("failed to decode {method} response: {reason}")]
    Decode { method: &'static str, reason: String },
}

/// Uniform interface over RPC nodes and the enriched indexer.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Whether [`indexed_transactions`](Self::indexed_transactions) can succeed at all.
    fn has_indexer(&self) -> bool;

    /// One page of signatures touching `address`, newest first.
    async fn signatures_for_address(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<SignatureInfo>, GatewayError>;

    /// Full parsed transaction, or `None` if the node does not know it.
    async fn transaction(&self, signature: &str) -> Result<Option<ChainTransaction>, GatewayError>;

    /// One page of enriched transactions for `address`, in indexer order (newest first).
    async fn indexed_transactions(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<IndexedTransaction>, GatewayError>;
}

/// Page backward through an address's signatures and return the oldest one seen.
///
/// Stops at the first short page, an empty page, a gateway failure, or after
/// `max_batches` pages, whichever comes first. When stopped early the result is
/// the oldest signature of the last page fetched.
pub async fn oldest_signature<G>(
    gateway: &G,
    address: &str,
    batch_size: usize,
    max_batches: usize,
) -> Option<SignatureInfo>
where
    G: ChainGateway + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut oldest: Option<SignatureInfo> = None;

    for batch_index in 0..max_batches {
        let before = oldest.as_ref().map(|info| info.signature.as_str());
        let batch = match gateway.signatures_for_address(address, batch_size, before).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(address, batch_index, error = %e, "signature pagination stopped early");
                break;
            }
        };

        let full_page = batch.len() >= batch_size;
        match batch.into_iter().last() {
            Some(last) => oldest = Some(last),
            None => break,
        }

        if !full_page {
            debug!(address, pages = batch_index + 1, "reached start of signature history");
            return oldest;
        }
    }

    if oldest.is_some() {
        debug!(address, max_batches, "signature pagination capped");
    }
    oldest
}

/// Fetch up to `max_transactions` enriched transactions, sorted oldest first.
///
/// The indexer returns newest first; callers always get ascending timestamps.
/// Pages are fetched until a short page, the bound, or an error after at least
/// one page has been collected.
pub async fn indexed_history<G>(
    gateway: &G,
    address: &str,
    page_size: usize,
    max_transactions: usize,
) -> Result<Vec<IndexedTransaction>, GatewayError>
where
    G: ChainGateway + ?Sized,
{
    if !gateway.has_indexer() {
        return Err(GatewayError::IndexerNotConfigured);
    }

    let page_size = page_size.max(1);
    let mut collected: Vec<IndexedTransaction> = Vec::new();

    while collected.len() < max_transactions {
        let limit = page_size.min(max_transactions - collected.len());
        let before = collected.last().map(|tx| tx.signature.clone());

        let page = match gateway
            .indexed_transactions(address, limit, before.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) if collected.is_empty() => return Err(e),
            Err(e) => {
                warn!(address, fetched = collected.len(), error = %e, "indexer pagination stopped early");
                break;
            }
        };

        let short_page = page.len() < limit;
        collected.extend(page);
        if short_page {
            break;
        }
    }

    collected.sort_by_key(|tx| tx.timestamp);
    Ok(collected)
}
