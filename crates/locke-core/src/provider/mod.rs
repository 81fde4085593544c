//! ============================================================================
//! Provider Module - Balance indexing backends
//! ============================================================================
//! The engine only sees holdings through `BalanceProvider`. `BagsClient`
//! is the HTTP implementation against the Bags API; tests plug in fakes.
//! ============================================================================

mod bags;

pub use bags::BagsClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Chain;

/// A holding as reported by the provider, before tier classification.
///
/// `chain` and `last_updated` stay raw strings so one entry on a chain we
/// don't index (or with an odd timestamp) can't fail the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHolding {
    pub token_address: String,
    pub balance: f64,
    pub chain: String,
    #[serde(default)]
    pub holder_rank: Option<u32>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl ProviderHolding {
    /// The chain this holding is on, if it is one the engine knows
    pub fn known_chain(&self) -> Option<Chain> {
        self.chain.parse().ok()
    }
}

/// Market metrics for a token (informational, not used for gating)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetrics {
    pub token_address: String,
    pub price_usd: f64,
    pub holder_count: u64,
    pub volume_24h: f64,
    pub market_cap: f64,
}

/// Source of wallet holdings
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// All holdings of a wallet on a chain
    async fn get_holdings(&self, wallet_address: &str, chain: Chain) -> Result<Vec<ProviderHolding>>;

    /// Token metrics, `None` when unavailable
    async fn get_token_metrics(&self, token_address: &str, chain: Chain) -> Option<TokenMetrics>;
}
