//! deployer-trust - Solana token deployer resolution and trust lookup
//!
//! Given a token mint this crate finds the wallet that really launched it,
//! where that wallet's first funds came from, what else it has launched, and
//! combines those signals with a third-party risk report.

pub mod types;
pub mod trust;

// Re-export main types for convenience
pub use trust::{ResultRecord, SignalAggregator, TrustCheckBuilder, TrustConfig};
pub use types::TokenCheckRequest;
