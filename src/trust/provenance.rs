//! Wallet provenance: how old a wallet is and who funded it first.
//!
//! The enriched indexer is preferred. Without it (or when it has nothing) the
//! oldest raw transaction is located by signature pagination and inspected for
//! an incoming native transfer, first among top-level instructions, then inner
//! instructions, then by matching lamport balance deltas. If all of that fails,
//! a fee payer other than the wallet is reported as the funder.

use crate::trust::gateway::{indexed_history, oldest_signature, ChainGateway};
use crate::trust::types::{ChainTransaction, IndexedTransaction, ParsedTransfer, ProvenanceRecord, TrustConfig};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `oldest_timestamp` and `now`, floored, never negative.
pub fn age_in_days(oldest_timestamp: i64, now: i64) -> i64 {
    (now - oldest_timestamp).max(0) / SECONDS_PER_DAY
}

/// Computes [`ProvenanceRecord`]s for wallets.
pub struct ProvenanceAnalyzer {
    gateway: Arc<dyn ChainGateway>,
    signature_batch_size: usize,
    max_signature_batches: usize,
    indexer_page_size: usize,
    max_indexer_transactions: usize,
    dust_threshold_lamports: u64,
    balance_delta_tolerance_lamports: u64,
}

impl ProvenanceAnalyzer {
    pub fn new(gateway: Arc<dyn ChainGateway>, config: &TrustConfig) -> Self {
        Self {
            gateway,
            signature_batch_size: config.signature_batch_size,
            max_signature_batches: config.max_signature_batches,
            indexer_page_size: config.indexer_page_size,
            max_indexer_transactions: config.max_indexer_transactions,
            dust_threshold_lamports: config.dust_threshold_lamports,
            balance_delta_tolerance_lamports: config.balance_delta_tolerance_lamports,
        }
    }

    /// Provenance of `wallet` as of now. Never fails; unknowns are `None`.
    pub async fn get_provenance(&self, wallet: &str) -> ProvenanceRecord {
        self.get_provenance_at(wallet, Utc::now().timestamp()).await
    }

    /// Provenance of `wallet` with ages computed against `now` (unix seconds).
    #[instrument(skip(self))]
    pub async fn get_provenance_at(&self, wallet: &str, now: i64) -> ProvenanceRecord {
        if wallet.trim().is_empty() {
            return ProvenanceRecord::empty(wallet);
        }

        if let Some(record) = self.from_indexer(wallet, now).await {
            return record;
        }

        self.from_rpc(wallet, now).await
    }

    async fn from_indexer(&self, wallet: &str, now: i64) -> Option<ProvenanceRecord> {
        if !self.gateway.has_indexer() {
            return None;
        }

        let history = match indexed_history(
            self.gateway.as_ref(),
            wallet,
            self.indexer_page_size,
            self.max_indexer_transactions,
        )
        .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Indexer unavailable for provenance, using RPC");
                return None;
            }
        };

        // Transactions without a block time sort first; skip them when dating the wallet.
        let oldest = history
            .iter()
            .find(|tx| tx.timestamp > 0)
            .or_else(|| history.first())?;
        let mut record = ProvenanceRecord::empty(wallet);
        if oldest.timestamp > 0 {
            record.age_in_days = Some(age_in_days(oldest.timestamp, now));
        }

        if let Some((funder, signature)) =
            first_indexed_funding(&history, wallet, self.dust_threshold_lamports)
        {
            debug!(funder = %funder, "Funding source found in indexed transfers");
            record.funded_by = Some(funder);
            record.funding_tx = Some(signature);
        } else if let Some(fee_payer) = oldest
            .fee_payer
            .as_deref()
            .filter(|payer| !payer.is_empty() && *payer != wallet)
        {
            debug!(fee_payer, "Using oldest fee payer as funder");
            record.funded_by = Some(fee_payer.to_string());
            record.funding_tx = Some(oldest.signature.clone());
        }

        Some(record)
    }

    async fn from_rpc(&self, wallet: &str, now: i64) -> ProvenanceRecord {
        let mut record = ProvenanceRecord::empty(wallet);

        let Some(oldest) = oldest_signature(
            self.gateway.as_ref(),
            wallet,
            self.signature_batch_size,
            self.max_signature_batches,
        )
        .await
        else {
            debug!("No signature history for wallet");
            return record;
        };

        record.age_in_days = oldest.block_time.map(|time| age_in_days(time, now));

        let transaction = match self.gateway.transaction(&oldest.signature).await {
            Ok(Some(tx)) => tx,
            Ok(None) => return record,
            Err(e) => {
                warn!(signature = %oldest.signature, error = %e, "Failed to fetch oldest wallet transaction");
                return record;
            }
        };

        if record.age_in_days.is_none() {
            record.age_in_days = transaction.block_time.map(|time| age_in_days(time, now));
        }

        if let Some(funder) = self.funder_in_transaction(&transaction, wallet) {
            record.funded_by = Some(funder);
            record.funding_tx = Some(oldest.signature);
        } else if let Some(fee_payer) = transaction.fee_payer().filter(|payer| *payer != wallet) {
            debug!(fee_payer, "Using oldest fee payer as funder");
            record.funded_by = Some(fee_payer.to_string());
            record.funding_tx = Some(oldest.signature);
        }

        record
    }

    /// Funder of `wallet` within one raw transaction.
    pub fn funder_in_transaction(&self, transaction: &ChainTransaction, wallet: &str) -> Option<String> {
        let funds_wallet = |transfer: &ParsedTransfer| {
            transfer.destination == wallet
                && transfer.source != wallet
                && transfer
                    .lamports
                    .map_or(false, |lamports| lamports > self.dust_threshold_lamports)
        };

        if let Some(transfer) = transaction.top_level_transfers().into_iter().find(|t| funds_wallet(t)) {
            return Some(transfer.source);
        }
        if let Some(transfer) = transaction.inner_transfers().into_iter().find(|t| funds_wallet(t)) {
            return Some(transfer.source);
        }

        balance_delta_funder(
            transaction,
            wallet,
            self.dust_threshold_lamports,
            self.balance_delta_tolerance_lamports,
        )
    }
}

/// First non-dust native transfer into `wallet` from another address, scanning oldest first.
pub fn first_indexed_funding(
    history: &[IndexedTransaction],
    wallet: &str,
    dust_threshold_lamports: u64,
) -> Option<(String, String)> {
    history.iter().find_map(|tx| {
        tx.native_transfers
            .iter()
            .find(|transfer| {
                transfer.to_user_account.as_deref() == Some(wallet)
                    && transfer
                        .from_user_account
                        .as_deref()
                        .map_or(false, |from| !from.is_empty() && from != wallet)
                    && transfer.amount > dust_threshold_lamports
            })
            .and_then(|transfer| transfer.from_user_account.clone())
            .map(|from| (from, tx.signature.clone()))
    })
}

/// Match the wallet's lamport gain against another account's loss.
///
/// Approximation: the first account in key order whose loss is within
/// `tolerance` of the gain is taken, even if several accounts would match.
pub fn balance_delta_funder(
    transaction: &ChainTransaction,
    wallet: &str,
    dust_threshold_lamports: u64,
    tolerance_lamports: u64,
) -> Option<String> {
    let changes = transaction.balance_changes();

    let gained = changes
        .iter()
        .find(|(account, _)| *account == wallet)
        .map(|(_, delta)| *delta)
        .filter(|delta| *delta > dust_threshold_lamports as i128)?;

    changes
        .iter()
        .find(|(account, delta)| {
            *account != wallet && *delta < 0 && (-*delta - gained).abs() <= tolerance_lamports as i128
        })
        .map(|(account, _)| account.to_string())
}
