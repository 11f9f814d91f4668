//! Trust score scaling and tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier label assigned from the 0–1000 trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    Elite,
    Trusted,
    Neutral,
    Risky,
    Danger,
}

/// Lower bounds, checked top to bottom.
const TIER_THRESHOLDS: &[(u16, TrustTier)] = &[
    (800, TrustTier::Elite),
    (600, TrustTier::Trusted),
    (400, TrustTier::Neutral),
    (200, TrustTier::Risky),
];

impl TrustTier {
    pub fn from_score(score: u16) -> Self {
        TIER_THRESHOLDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(TrustTier::Danger)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrustTier::Elite => "Elite",
            TrustTier::Trusted => "Trusted",
            TrustTier::Neutral => "Neutral",
            TrustTier::Risky => "Risky",
            TrustTier::Danger => "Danger",
        }
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider base score rescaled to 0–1000 with its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustScore {
    /// Provider score, 0–100
    pub base: u8,
    /// Rescaled score, 0–1000
    pub value: u16,
    pub tier: TrustTier,
}

impl TrustScore {
    pub fn from_base(base: u8) -> Self {
        let base = base.min(100);
        let value = base as u16 * 10;
        Self {
            base,
            value,
            tier: TrustTier::from_score(value),
        }
    }
}
