//! Core types and data structures for the trust lookup engine.

use crate::trust::classifier::DenyList;
use crate::trust::scoring::TrustScore;
use crate::types::{Address, TokenMint, TransactionSignature};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

/// Which strategy produced a resolved deployer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployerSource {
    /// The reported creator was already a user wallet
    DirectReport,
    /// Fee payer of the oldest indexed transaction
    IndexerFeePayer,
    /// First qualifying signer of the oldest raw transaction
    RpcSigner,
    /// Source of an inner transfer in the oldest raw transaction
    RpcInnerInstruction,
    /// `creator: <address>` found in the program logs
    RpcLogParse,
    /// Nothing qualified; the reported creator is returned as-is
    FallbackToReported,
}

impl DeployerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployerSource::DirectReport => "direct-report",
            DeployerSource::IndexerFeePayer => "indexer-feepayer",
            DeployerSource::RpcSigner => "rpc-signer",
            DeployerSource::RpcInnerInstruction => "rpc-inner-instruction",
            DeployerSource::RpcLogParse => "rpc-log-parse",
            DeployerSource::FallbackToReported => "fallback-to-reported",
        }
    }
}

/// Best-guess human deployer of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDeployer {
    pub address: Address,
    pub source: DeployerSource,
}

impl ResolvedDeployer {
    pub fn new(address: impl Into<Address>, source: DeployerSource) -> Self {
        Self {
            address: address.into(),
            source,
        }
    }
}

/// Age and funding origin of a wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub wallet_address: Address,
    /// Whole days since the oldest observed transaction
    pub age_in_days: Option<i64>,
    pub funded_by: Option<Address>,
    pub funding_tx: Option<TransactionSignature>,
}

impl ProvenanceRecord {
    /// A record with every field unknown.
    pub fn empty(wallet_address: impl Into<Address>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            ..Default::default()
        }
    }
}

/// A token created by a deployer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedToken {
    pub mint: TokenMint,
    /// Unix timestamp (seconds) of creation
    pub created_at: Option<i64>,
    pub market_cap: Option<f64>,
}

// --- Raw RPC data ---

/// One entry of a `getSignaturesForAddress` page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: TransactionSignature,
    pub block_time: Option<i64>,
}

/// A `getTransaction` result in `jsonParsed` encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTransaction {
    #[serde(default)]
    pub slot: u64,
    pub block_time: Option<i64>,
    pub transaction: TransactionBody,
    pub meta: Option<TransactionMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    #[serde(default)]
    pub signatures: Vec<TransactionSignature>,
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    pub pubkey: Address,
    #[serde(default)]
    pub signer: bool,
    #[serde(default)]
    pub writable: bool,
}

/// A parsed or partially decoded instruction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub program: Option<String>,
    pub program_id: Option<Address>,
    pub parsed: Option<Value>,
    #[serde(default)]
    pub accounts: Vec<Address>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerInstructions {
    pub index: u8,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    pub inner_instructions: Option<Vec<InnerInstructions>>,
    pub log_messages: Option<Vec<String>>,
}

/// A transfer-like instruction extracted from parsed instruction data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransfer {
    pub source: Address,
    pub destination: Address,
    /// Present for native (system program) transfers only
    pub lamports: Option<u64>,
}

impl Instruction {
    /// Interpret this instruction as a transfer, if it is one.
    pub fn transfer(&self) -> Option<ParsedTransfer> {
        let parsed = self.parsed.as_ref()?;
        let kind = parsed.get("type")?.as_str()?;
        let info = parsed.get("info")?;

        let destination_key = match kind {
            "transfer" | "transferChecked" | "transferWithSeed" => "destination",
            "createAccount" | "createAccountWithSeed" => "newAccount",
            _ => return None,
        };

        Some(ParsedTransfer {
            source: info.get("source")?.as_str()?.to_string(),
            destination: info.get(destination_key)?.as_str()?.to_string(),
            lamports: info.get("lamports").and_then(Value::as_u64),
        })
    }

    pub fn is_system_program(&self) -> bool {
        self.program.as_deref() == Some("system")
            || self.program_id.as_deref() == Some(SYSTEM_PROGRAM_ID)
    }

    /// Lamport transfer issued by the system program. SPL token transfers
    /// move between token accounts and are excluded.
    pub fn native_transfer(&self) -> Option<ParsedTransfer> {
        if !self.is_system_program() {
            return None;
        }
        self.transfer().filter(|transfer| transfer.lamports.is_some())
    }
}

impl ChainTransaction {
    /// The transaction's own signature.
    pub fn signature(&self) -> Option<&str> {
        self.transaction.signatures.first().map(String::as_str)
    }

    /// The fee payer is always the first account key.
    pub fn fee_payer(&self) -> Option<&str> {
        self.transaction
            .message
            .account_keys
            .first()
            .map(|key| key.pubkey.as_str())
    }

    /// Signer accounts in account-key order.
    pub fn signers(&self) -> impl Iterator<Item = &str> {
        self.transaction
            .message
            .account_keys
            .iter()
            .filter(|key| key.signer)
            .map(|key| key.pubkey.as_str())
    }

    /// Transfers among the top-level instructions, in order.
    pub fn top_level_transfers(&self) -> Vec<ParsedTransfer> {
        self.transaction
            .message
            .instructions
            .iter()
            .filter_map(Instruction::transfer)
            .collect()
    }

    /// Transfers among the inner instructions, in order of appearance.
    pub fn inner_transfers(&self) -> Vec<ParsedTransfer> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.inner_instructions.as_ref())
            .map(|groups| {
                groups
                    .iter()
                    .flat_map(|group| group.instructions.iter())
                    .filter_map(Instruction::transfer)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// System-program lamport transfers among the inner instructions.
    pub fn inner_native_transfers(&self) -> Vec<ParsedTransfer> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.inner_instructions.as_ref())
            .map(|groups| {
                groups
                    .iter()
                    .flat_map(|group| group.instructions.iter())
                    .filter_map(Instruction::native_transfer)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn log_messages(&self) -> &[String] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.log_messages.as_deref())
            .unwrap_or(&[])
    }

    /// Lamport balance change per account, in account-key order.
    pub fn balance_changes(&self) -> Vec<(&str, i128)> {
        let Some(meta) = self.meta.as_ref() else {
            return Vec::new();
        };

        self.transaction
            .message
            .account_keys
            .iter()
            .zip(meta.pre_balances.iter().zip(meta.post_balances.iter()))
            .map(|(key, (pre, post))| (key.pubkey.as_str(), *post as i128 - *pre as i128))
            .collect()
    }
}

// --- Enriched indexer data ---

/// A transaction as returned by the enriched indexer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTransaction {
    pub signature: TransactionSignature,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub timestamp: i64,
    pub fee_payer: Option<Address>,
    /// Platform classification tag, e.g. `CREATE` or `SWAP`
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    /// Originating program tag, e.g. `PUMP_FUN`
    pub source: Option<String>,
    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,
    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    pub from_user_account: Option<Address>,
    pub to_user_account: Option<Address>,
    /// Amount in lamports
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub from_user_account: Option<Address>,
    pub to_user_account: Option<Address>,
    pub mint: Option<TokenMint>,
    #[serde(default)]
    pub token_amount: f64,
}

// --- Token report provider ---

/// Third-party token report, as consumed by the aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenReport {
    #[serde(default)]
    pub creator: Option<Address>,
    #[serde(default)]
    pub creator_tokens: Option<Vec<ReportedCreatorToken>>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub token: Option<ReportTokenInfo>,
    #[serde(default)]
    pub top_holders: Option<Vec<ReportHolder>>,
    #[serde(default)]
    pub total_holders: Option<u64>,
    #[serde(default)]
    pub risks: Option<Vec<ReportRisk>>,
    #[serde(default)]
    pub rugged: Option<bool>,
    #[serde(default)]
    pub token_meta: Option<ReportTokenMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedCreatorToken {
    pub mint: TokenMint,
    pub market_cap: Option<f64>,
    /// RFC 3339 timestamp
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTokenInfo {
    pub supply: Option<u64>,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHolder {
    pub address: Address,
    pub pct: Option<f64>,
    pub owner: Option<Address>,
    pub insider: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRisk {
    pub name: String,
    pub level: Option<String>,
    pub score: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTokenMeta {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub uri: Option<String>,
}

/// Everything known about one check, assembled once by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub mint: TokenMint,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub dev_handle: Option<String>,
    pub reported_creator: Address,
    pub deployer: ResolvedDeployer,
    pub provenance: ProvenanceRecord,
    pub other_tokens: Vec<CreatedToken>,
    pub risks: Vec<ReportRisk>,
    pub rugged: bool,
    pub total_holders: Option<u64>,
    /// Largest single holder share, in percent
    pub top_holder_pct: Option<f64>,
    pub price: Option<f64>,
    pub score: Option<TrustScore>,
    /// Unix timestamp (seconds)
    pub checked_at: i64,
}

/// Lookup engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// RPC endpoints, tried in order
    pub rpc_endpoints: Vec<String>,
    /// Enriched indexer API key; the indexer is disabled without one
    pub indexer_api_key: Option<String>,
    /// Enriched indexer base URL
    pub indexer_base_url: String,
    /// Token report / score provider base URL
    pub report_api_url: String,
    /// Network timeout per request in seconds
    pub rpc_timeout_seconds: u64,
    /// Outbound requests per second (0 disables throttling)
    pub rate_limit_requests_per_second: u32,
    /// `getSignaturesForAddress` page size
    pub signature_batch_size: usize,
    /// Maximum signature pages fetched per lookup
    pub max_signature_batches: usize,
    /// Indexer page size
    pub indexer_page_size: usize,
    /// Maximum indexed transactions fetched for provenance
    pub max_indexer_transactions: usize,
    /// Recent transactions scanned for other created tokens
    pub history_transaction_limit: usize,
    /// Native transfers at or below this are ignored when looking for funding
    pub dust_threshold_lamports: u64,
    /// Allowed gap between a wallet's gain and its funder's loss
    pub balance_delta_tolerance_lamports: u64,
    /// Token report retry attempts
    pub report_retry_attempts: usize,
    /// Recent-checks feed capacity
    pub recent_checks_capacity: usize,
    /// Known non-user addresses and patterns
    pub denylist: DenyList,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            rpc_endpoints: vec!["https://api.mainnet-beta.solana.com".to_string()],
            indexer_api_key: None,
            indexer_base_url: "https://api.helius.xyz".to_string(),
            report_api_url: "https://api.rugcheck.xyz/v1".to_string(),
            rpc_timeout_seconds: 30,
            rate_limit_requests_per_second: 20,
            signature_batch_size: 1000,
            max_signature_batches: 20,
            indexer_page_size: 100,
            max_indexer_transactions: 1000,
            history_transaction_limit: 100,
            dust_threshold_lamports: 1_000_000,
            balance_delta_tolerance_lamports: 1_000_000,
            report_retry_attempts: 3,
            recent_checks_capacity: 50,
            denylist: DenyList::default(),
        }
    }
}

impl TrustConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(urls) = std::env::var("SOLANA_RPC_URLS") {
            let endpoints: Vec<String> = urls
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect();
            if !endpoints.is_empty() {
                config.rpc_endpoints = endpoints;
            }
        }
        if let Ok(key) = std::env::var("HELIUS_API_KEY") {
            if !key.trim().is_empty() {
                config.indexer_api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(url) = std::env::var("HELIUS_BASE_URL") {
            config.indexer_base_url = url;
        }
        if let Ok(url) = std::env::var("RUGCHECK_API_URL") {
            config.report_api_url = url;
        }
        if let Ok(limit) = std::env::var("TRUST_RATE_LIMIT") {
            config.rate_limit_requests_per_second = limit
                .trim()
                .parse()
                .context("TRUST_RATE_LIMIT must be a non-negative integer")?;
        }

        Ok(config)
    }
}
