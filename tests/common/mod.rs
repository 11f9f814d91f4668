//! Shared fixtures for integration tests: a scripted, call-counting gateway
//! and builders for chain data.

#![allow(dead_code)]

use async_trait::async_trait;
use deployer_trust::trust::gateway::{ChainGateway, GatewayError};
use deployer_trust::trust::types::{
    AccountKey, ChainTransaction, IndexedTransaction, InnerInstructions, Instruction,
    NativeTransfer, SignatureInfo, TokenTransfer, TransactionBody, TransactionMessage,
    TransactionMeta,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PUMP_AUTHORITY: &str = "TSLvdd1pWpHVjahSpsvCXUbgwsL3JAcvokwaKt1eokM";
pub const PUMP_MINT: &str = "2eXamy7t3kvKhfV6aJ6Uwe3eh8cuREFcTKs1mFKZpump";
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

/// Gateway answering from in-memory tables.
///
/// Signature and indexer lists are stored newest first, like the real
/// services return them, and paged with `before`.
#[derive(Default)]
pub struct StubGateway {
    indexer_enabled: bool,
    indexed: HashMap<String, Vec<IndexedTransaction>>,
    signatures: HashMap<String, Vec<SignatureInfo>>,
    transactions: HashMap<String, ChainTransaction>,
    endless_signatures: bool,
    failing: bool,
    pub signature_calls: AtomicUsize,
    pub transaction_calls: AtomicUsize,
    pub indexer_calls: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indexer(mut self) -> Self {
        self.indexer_enabled = true;
        self
    }

    /// Indexed transactions for `address`, newest first.
    pub fn with_indexed(mut self, address: &str, transactions: Vec<IndexedTransaction>) -> Self {
        self.indexer_enabled = true;
        self.indexed.insert(address.to_string(), transactions);
        self
    }

    /// Signature history for `address`, newest first.
    pub fn with_signatures(mut self, address: &str, signatures: Vec<SignatureInfo>) -> Self {
        self.signatures.insert(address.to_string(), signatures);
        self
    }

    pub fn with_transaction(mut self, transaction: ChainTransaction) -> Self {
        let signature = transaction.signature().unwrap_or_default().to_string();
        self.transactions.insert(signature, transaction);
        self
    }

    /// Every signature page is full, so pagination never reaches the start.
    pub fn endless(mut self) -> Self {
        self.endless_signatures = true;
        self
    }

    /// Every call fails as if all endpoints were down.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.signature_calls.load(Ordering::SeqCst)
            + self.transaction_calls.load(Ordering::SeqCst)
            + self.indexer_calls.load(Ordering::SeqCst)
    }

    pub fn signature_calls(&self) -> usize {
        self.signature_calls.load(Ordering::SeqCst)
    }

    pub fn indexer_calls(&self) -> usize {
        self.indexer_calls.load(Ordering::SeqCst)
    }
}

fn page<T: Clone>(items: &[T], limit: usize, before: Option<&str>, key: impl Fn(&T) -> &str) -> Vec<T> {
    let start = match before {
        Some(before) => match items.iter().position(|item| key(item) == before) {
            Some(index) => index + 1,
            None => return Vec::new(),
        },
        None => 0,
    };
    items.iter().skip(start).take(limit).cloned().collect()
}

#[async_trait]
impl ChainGateway for StubGateway {
    fn has_indexer(&self) -> bool {
        self.indexer_enabled
    }

    async fn signatures_for_address(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<SignatureInfo>, GatewayError> {
        let call = self.signature_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(GatewayError::Unavailable { method: "getSignaturesForAddress", attempts: 2 });
        }

        if self.endless_signatures {
            return Ok((0..limit)
                .map(|i| SignatureInfo {
                    signature: format!("{}-{}-{}", address, call, i),
                    block_time: Some(1_700_000_000 - (call * limit + i) as i64),
                })
                .collect());
        }

        let history = self.signatures.get(address).map(Vec::as_slice).unwrap_or(&[]);
        Ok(page(history, limit, before, |info| info.signature.as_str()))
    }

    async fn transaction(&self, signature: &str) -> Result<Option<ChainTransaction>, GatewayError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(GatewayError::Unavailable { method: "getTransaction", attempts: 2 });
        }
        Ok(self.transactions.get(signature).cloned())
    }

    async fn indexed_transactions(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<IndexedTransaction>, GatewayError> {
        self.indexer_calls.fetch_add(1, Ordering::SeqCst);
        if !self.indexer_enabled {
            return Err(GatewayError::IndexerNotConfigured);
        }
        if self.failing {
            return Err(GatewayError::Unavailable { method: "indexer", attempts: 1 });
        }

        let history = self.indexed.get(address).map(Vec::as_slice).unwrap_or(&[]);
        Ok(page(history, limit, before, |tx| tx.signature.as_str()))
    }
}

// --- Builders ---

pub fn signature(signature: &str, block_time: i64) -> SignatureInfo {
    SignatureInfo {
        signature: signature.to_string(),
        block_time: Some(block_time),
    }
}

pub fn indexed(signature: &str, timestamp: i64, fee_payer: &str) -> IndexedTransaction {
    IndexedTransaction {
        signature: signature.to_string(),
        timestamp,
        fee_payer: Some(fee_payer.to_string()),
        ..Default::default()
    }
}

pub fn native_transfer(from: &str, to: &str, amount: u64) -> NativeTransfer {
    NativeTransfer {
        from_user_account: Some(from.to_string()),
        to_user_account: Some(to.to_string()),
        amount,
    }
}

pub fn creation(signature: &str, timestamp: i64, deployer: &str, mint: &str) -> IndexedTransaction {
    IndexedTransaction {
        tx_type: Some("CREATE".to_string()),
        token_transfers: vec![TokenTransfer {
            to_user_account: Some(deployer.to_string()),
            mint: Some(mint.to_string()),
            token_amount: 1_000_000.0,
            ..Default::default()
        }],
        ..indexed(signature, timestamp, deployer)
    }
}

pub fn system_transfer(source: &str, destination: &str, lamports: u64) -> Instruction {
    Instruction {
        program: Some("system".to_string()),
        program_id: Some(SYSTEM_PROGRAM.to_string()),
        parsed: Some(json!({
            "type": "transfer",
            "info": {"source": source, "destination": destination, "lamports": lamports}
        })),
        ..Default::default()
    }
}

/// Raw transaction with the given `(account, signer)` keys.
pub fn raw_transaction(
    signature: &str,
    block_time: i64,
    keys: &[(&str, bool)],
    instructions: Vec<Instruction>,
    inner: Vec<Instruction>,
    logs: &[&str],
) -> ChainTransaction {
    ChainTransaction {
        slot: 250_000_000,
        block_time: Some(block_time),
        transaction: TransactionBody {
            signatures: vec![signature.to_string()],
            message: TransactionMessage {
                account_keys: keys
                    .iter()
                    .map(|(pubkey, signer)| AccountKey {
                        pubkey: pubkey.to_string(),
                        signer: *signer,
                        writable: true,
                    })
                    .collect(),
                instructions,
            },
        },
        meta: Some(TransactionMeta {
            fee: 5_000,
            inner_instructions: Some(vec![InnerInstructions { index: 0, instructions: inner }]),
            log_messages: Some(logs.iter().map(|line| line.to_string()).collect()),
            ..Default::default()
        }),
    }
}
