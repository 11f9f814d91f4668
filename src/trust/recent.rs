//! Bounded "recent checks" feed.
//!
//! Newest first, one entry per token address, never longer than its capacity.

use crate::trust::scoring::TrustTier;
use crate::trust::types::ResultRecord;
use crate::types::{Address, TokenMint};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tracing::debug;

/// One row of the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCheck {
    pub token_address: TokenMint,
    pub symbol: Option<String>,
    pub deployer: Address,
    pub trust_score: Option<u16>,
    pub tier: Option<TrustTier>,
    pub checked_at: i64,
}

impl From<&ResultRecord> for RecentCheck {
    fn from(record: &ResultRecord) -> Self {
        Self {
            token_address: record.mint.clone(),
            symbol: record.token_symbol.clone(),
            deployer: record.deployer.address.clone(),
            trust_score: record.score.map(|score| score.value),
            tier: record.score.map(|score| score.tier),
            checked_at: record.checked_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentChecks {
    capacity: usize,
    entries: VecDeque<RecentCheck>,
}

impl RecentChecks {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Insert at the front, replacing any entry for the same token and
    /// evicting the oldest entries beyond capacity.
    pub fn insert(&mut self, check: RecentCheck) {
        self.entries
            .retain(|existing| existing.token_address != check.token_address);
        self.entries.push_front(check);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &RecentCheck> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Load a feed from a JSON file, or start an empty one if the file is missing.
    /// The configured capacity wins over the stored one.
    pub fn load_or_new(path: &Path, capacity: usize) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(capacity));
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feed {}", path.display()))?;
        let stored: RecentChecks = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse feed {}", path.display()))?;

        let mut feed = Self::new(capacity);
        for check in stored.entries.into_iter().rev() {
            feed.insert(check);
        }
        debug!("Loaded {} recent checks from {}", feed.len(), path.display());
        Ok(feed)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write feed {}", path.display()))
    }
}
