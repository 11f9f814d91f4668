//! Other tokens launched by a deployer ("serial deployer" signal).

use crate::trust::gateway::ChainGateway;
use crate::trust::types::{CreatedToken, IndexedTransaction, ReportedCreatorToken, TrustConfig};
use chrono::DateTime;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Transaction types the indexer uses for token launches.
pub const DEFAULT_CREATION_TYPES: &[&str] = &["CREATE"];

/// Lists tokens created by a wallet from its recent indexed transactions.
pub struct DeployerTokenHistory {
    gateway: Arc<dyn ChainGateway>,
    transaction_limit: usize,
    creation_types: Vec<String>,
}

impl DeployerTokenHistory {
    pub fn new(gateway: Arc<dyn ChainGateway>, config: &TrustConfig) -> Self {
        Self {
            gateway,
            transaction_limit: config.history_transaction_limit,
            creation_types: DEFAULT_CREATION_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Tokens created by `deployer`, newest first, excluding `exclude_mint`.
    /// Any data-source failure yields an empty list.
    #[instrument(skip(self))]
    pub async fn list_other_tokens(&self, deployer: &str, exclude_mint: &str) -> Vec<CreatedToken> {
        if deployer.trim().is_empty() || !self.gateway.has_indexer() {
            return Vec::new();
        }

        let transactions = match self
            .gateway
            .indexed_transactions(deployer, self.transaction_limit, None)
            .await
        {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!(error = %e, "Token history unavailable");
                return Vec::new();
            }
        };

        let tokens = created_tokens(
            transactions.iter().take(self.transaction_limit),
            deployer,
            exclude_mint,
            &self.creation_types,
        );
        debug!("Found {} other tokens for deployer", tokens.len());
        tokens
    }
}

/// Extract created mints from creation transactions paid by `deployer`.
pub fn created_tokens<'a>(
    transactions: impl IntoIterator<Item = &'a IndexedTransaction>,
    deployer: &str,
    exclude_mint: &str,
    creation_types: &[String],
) -> Vec<CreatedToken> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(exclude_mint.to_lowercase());

    let mut tokens = Vec::new();
    for tx in transactions {
        let is_creation = tx
            .tx_type
            .as_deref()
            .map_or(false, |kind| creation_types.iter().any(|t| t.eq_ignore_ascii_case(kind)));
        if !is_creation || tx.fee_payer.as_deref() != Some(deployer) {
            continue;
        }

        for transfer in &tx.token_transfers {
            let Some(mint) = transfer.mint.as_deref().filter(|m| !m.is_empty()) else {
                continue;
            };
            if seen.insert(mint.to_lowercase()) {
                tokens.push(CreatedToken {
                    mint: mint.to_string(),
                    created_at: (tx.timestamp > 0).then_some(tx.timestamp),
                    market_cap: None,
                });
            }
        }
    }
    tokens
}

/// Convert the report provider's `creatorTokens` into [`CreatedToken`]s,
/// with the same dedup and exclusion rules.
pub fn tokens_from_report(reported: &[ReportedCreatorToken], exclude_mint: &str) -> Vec<CreatedToken> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(exclude_mint.to_lowercase());

    reported
        .iter()
        .filter(|token| !token.mint.is_empty() && seen.insert(token.mint.to_lowercase()))
        .map(|token| CreatedToken {
            mint: token.mint.clone(),
            created_at: token
                .created_at
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|time| time.timestamp()),
            market_cap: token.market_cap,
        })
        .collect()
}
