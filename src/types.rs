//! Core request types for the deployer-trust lookup tool.

use serde::{Deserialize, Serialize};

/// A base58 account address (wallet, program or platform authority).
pub type Address = String;

/// A base58 token mint address.
pub type TokenMint = String;

/// A base58 transaction signature.
pub type TransactionSignature = String;

/// A user-submitted trust check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCheckRequest {
    /// The token contract address to check
    pub mint: TokenMint,
    /// Optional developer Twitter handle, without the leading `@`
    pub dev_handle: Option<String>,
}

impl TokenCheckRequest {
    /// Create a request for a mint with no developer handle.
    pub fn new(mint: impl Into<TokenMint>) -> Self {
        Self {
            mint: mint.into(),
            dev_handle: None,
        }
    }

    /// Attach a developer handle. A leading `@` is stripped.
    pub fn with_dev_handle(mut self, handle: impl AsRef<str>) -> Self {
        let handle = handle.as_ref().trim().trim_start_matches('@');
        self.dev_handle = if handle.is_empty() {
            None
        } else {
            Some(handle.to_string())
        };
        self
    }
}
