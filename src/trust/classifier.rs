//! Known non-user address classification.
//!
//! Programs, sysvars and launch-platform authorities show up as "creators" and
//! signers all the time but never identify a person. The classifier answers one
//! question: can this address be returned as a deployer? The table it consults
//! is plain data ([`DenyList`]) so new platform authorities can be added through
//! configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Built-in known non-user addresses, with labels.
pub const KNOWN_NON_USER_ADDRESSES: &[(&str, &str)] = &[
    // Native programs
    ("11111111111111111111111111111111", "System Program"),
    ("ComputeBudget111111111111111111111111111111", "Compute Budget Program"),
    ("Vote111111111111111111111111111111111111111", "Vote Program"),
    ("Stake11111111111111111111111111111111111111", "Stake Program"),
    ("BPFLoaderUpgradeab1e11111111111111111111111", "BPF Upgradeable Loader"),
    ("AddressLookupTab1e1111111111111111111111111", "Address Lookup Table Program"),
    // Sysvars
    ("SysvarRent111111111111111111111111111111111", "Rent Sysvar"),
    ("SysvarC1ock11111111111111111111111111111111", "Clock Sysvar"),
    ("Sysvar1nstructions1111111111111111111111111", "Instructions Sysvar"),
    ("SysvarRecentB1ockHashes11111111111111111111", "Recent Blockhashes Sysvar"),
    // Token programs
    ("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "SPL Token Program"),
    ("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb", "SPL Token-2022 Program"),
    ("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", "Associated Token Account Program"),
    ("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s", "Metaplex Token Metadata"),
    ("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr", "Memo Program"),
    // pump.fun
    ("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", "pump.fun Program"),
    ("TSLvdd1pWpHVjahSpsvCXUbgwsL3JAcvokwaKt1eokM", "pump.fun Mint Authority"),
    ("Ce6TQqeHC9p8KetsN6JsjHK7UTZk7nasjjnr7XxXp9F1", "pump.fun Event Authority"),
    ("4wTV1YmiEkRvAtNtsSGPtUrqRYQMe5SKy2uB4Jjaxnjf", "pump.fun Global"),
    ("CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM", "pump.fun Fee Recipient"),
];

/// Mint suffixes a launch platform reserves for its own tokens.
pub const DEFAULT_PLATFORM_MINT_SUFFIXES: &[&str] = &["pump"];

/// Trailing `1`s at or above this length mark a system-derived address.
pub const DEFAULT_PADDING_RUN: usize = 12;

/// Classifier data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyList {
    /// Exact-match non-user addresses
    pub addresses: Vec<String>,
    /// Mint suffixes that mark platform-launched tokens
    pub platform_mint_suffixes: Vec<String>,
    /// Minimum run of trailing `1`s treated as a system-derived address
    pub padding_run: usize,
}

impl Default for DenyList {
    fn default() -> Self {
        Self {
            addresses: KNOWN_NON_USER_ADDRESSES
                .iter()
                .map(|(address, _)| address.to_string())
                .collect(),
            platform_mint_suffixes: DEFAULT_PLATFORM_MINT_SUFFIXES
                .iter()
                .map(|suffix| suffix.to_string())
                .collect(),
            padding_run: DEFAULT_PADDING_RUN,
        }
    }
}

impl DenyList {
    /// Add extra addresses on top of the current table.
    pub fn with_addresses<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses.extend(extra.into_iter().map(Into::into));
        self
    }
}

/// Pure predicate over addresses, built from a [`DenyList`].
#[derive(Debug, Clone)]
pub struct AddressClassifier {
    addresses: HashSet<String>,
    platform_mint_suffixes: Vec<String>,
    padding_run: usize,
}

impl AddressClassifier {
    pub fn new(denylist: &DenyList) -> Self {
        Self {
            addresses: denylist.addresses.iter().cloned().collect(),
            platform_mint_suffixes: denylist.platform_mint_suffixes.clone(),
            padding_run: denylist.padding_run.max(1),
        }
    }

    /// True for programs, sysvars, platform authorities and empty input.
    pub fn is_known_non_user(&self, address: &str) -> bool {
        let address = address.trim();
        if address.is_empty() {
            return true;
        }
        if self.addresses.contains(address) {
            return true;
        }

        let trailing_padding = address.chars().rev().take_while(|&c| c == '1').count();
        trailing_padding >= self.padding_run
    }

    /// [`is_known_non_user`](Self::is_known_non_user) extended to absent values.
    pub fn is_known_non_user_opt(&self, address: Option<&str>) -> bool {
        address.map_or(true, |address| self.is_known_non_user(address))
    }

    /// True when the mint carries a launch platform's reserved suffix.
    pub fn is_platform_mint(&self, mint: &str) -> bool {
        let mint = mint.trim();
        self.platform_mint_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && mint.ends_with(suffix.as_str()))
    }
}

impl Default for AddressClassifier {
    fn default() -> Self {
        Self::new(&DenyList::default())
    }
}
