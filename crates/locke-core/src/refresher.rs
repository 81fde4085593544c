//! ============================================================================
//! Context Refresher - Builds holdings snapshots from the balance provider
//! ============================================================================
//! Fetches a wallet's holdings, classifies each one into a holder tier and
//! returns a brand new `HoldingsContext`.
//!
//! Fails closed: a provider error, a timeout or a malformed address yields
//! an empty context, which denies every rule that needs a balance. The
//! accompanying `ProviderStatus` records why, so "no holdings" and
//! "provider down" stay distinguishable.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::LockeConfig;
use crate::error::LockeError;
use crate::provider::{BalanceProvider, ProviderHolding};
use crate::tier::TierPolicy;
use crate::types::{Chain, HoldingsContext, TokenHolding};

/// What happened when the provider was asked for holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Provider answered; `holdings` entries were kept
    Fetched { holdings: usize },
    /// Provider failed or was never asked; context is empty
    Unavailable { reason: String },
}

/// A refreshed context plus the provider status that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub context: HoldingsContext,
    pub status: ProviderStatus,
}

impl RefreshReport {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, ProviderStatus::Unavailable { .. })
    }
}

/// Orchestrates provider fetch + tier classification
pub struct ContextRefresher {
    provider: Arc<dyn BalanceProvider>,
    policy: TierPolicy,
    timeout: Duration,
}

impl ContextRefresher {
    /// Create a refresher with the default tier policy and timeout
    pub fn new(provider: Arc<dyn BalanceProvider>) -> Self {
        Self::with_config(provider, &LockeConfig::default())
    }

    /// Create a refresher using the configured tier policy and timeout
    pub fn with_config(provider: Arc<dyn BalanceProvider>, config: &LockeConfig) -> Self {
        Self {
            provider,
            policy: config.tier_policy,
            timeout: config.request_timeout(),
        }
    }

    /// Refresh and return only the context
    pub async fn refresh_context(&self, wallet_address: &str, chain: Chain) -> HoldingsContext {
        self.refresh(wallet_address, chain).await.context
    }

    /// Refresh, reporting whether the provider actually answered
    pub async fn refresh(&self, wallet_address: &str, chain: Chain) -> RefreshReport {
        match self.fetch(wallet_address, chain).await {
            Ok(raw) => {
                let holdings = self.classify(raw, chain);
                info!(
                    "Refreshed context for {} on {}: {} holdings",
                    wallet_address,
                    chain,
                    holdings.len()
                );
                RefreshReport {
                    status: ProviderStatus::Fetched {
                        holdings: holdings.len(),
                    },
                    context: HoldingsContext::new(wallet_address, chain, holdings),
                }
            }
            Err(e) => {
                warn!(
                    "Holdings unavailable for {} on {}: {} - using empty holdings",
                    wallet_address, chain, e
                );
                RefreshReport {
                    status: ProviderStatus::Unavailable {
                        reason: e.to_string(),
                    },
                    context: HoldingsContext::empty(wallet_address, chain),
                }
            }
        }
    }

    async fn fetch(
        &self,
        wallet_address: &str,
        chain: Chain,
    ) -> Result<Vec<ProviderHolding>, LockeError> {
        chain.validate_address(wallet_address)?;

        match tokio::time::timeout(self.timeout, self.provider.get_holdings(wallet_address, chain))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LockeError::ProviderTimeout(self.timeout.as_secs())),
        }
    }

    fn classify(&self, raw: Vec<ProviderHolding>, chain: Chain) -> Vec<TokenHolding> {
        raw.into_iter()
            .filter_map(|h| match h.known_chain() {
                Some(held_on) if held_on == chain => Some(TokenHolding {
                    tier: Some(self.policy.classify(h.balance, h.holder_rank)),
                    token_address: h.token_address,
                    chain: held_on,
                    balance: h.balance,
                }),
                _ => {
                    debug!(
                        "Dropping {} holding of {} from {} refresh",
                        h.chain, h.token_address, chain
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Result;
    use crate::provider::TokenMetrics;
    use crate::types::HolderTier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const WALLET: &str = "8i51XNNpGaKaj4G4nDdmQh95v4FKAxw8mhtaRoKd9tE8";

    /// In-memory provider with a call counter
    pub(crate) struct FakeProvider {
        pub holdings: Result<Vec<ProviderHolding>>,
        pub delay: Option<Duration>,
        pub calls: AtomicUsize,
    }

    impl FakeProvider {
        pub(crate) fn with(holdings: Vec<ProviderHolding>) -> Self {
            Self {
                holdings: Ok(holdings),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(err: LockeError) -> Self {
            Self {
                holdings: Err(err),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BalanceProvider for FakeProvider {
        async fn get_holdings(&self, _wallet: &str, _chain: Chain) -> Result<Vec<ProviderHolding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.holdings.clone()
        }

        async fn get_token_metrics(&self, _token: &str, _chain: Chain) -> Option<TokenMetrics> {
            None
        }
    }

    pub(crate) fn raw(token: &str, balance: f64, rank: Option<u32>) -> ProviderHolding {
        ProviderHolding {
            token_address: token.into(),
            balance,
            chain: "solana".into(),
            holder_rank: rank,
            last_updated: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_classifies_tiers() {
        let provider = Arc::new(FakeProvider::with(vec![
            raw("A", 500.0, None),
            raw("B", 250_000.0, None),
            raw("C", 10.0, Some(3)),
        ]));
        let refresher = ContextRefresher::new(provider);

        let report = refresher.refresh(WALLET, Chain::Solana).await;
        assert_eq!(report.status, ProviderStatus::Fetched { holdings: 3 });
        assert!(!report.is_degraded());

        let ctx = report.context;
        assert_eq!(ctx.wallet_address, WALLET);
        assert_eq!(ctx.chain, Chain::Solana);
        let tier = |t: &str| ctx.find_holding(t, Chain::Solana).and_then(|h| h.tier);
        assert_eq!(tier("A"), Some(HolderTier::Holder));
        assert_eq!(tier("B"), Some(HolderTier::Whale));
        assert_eq!(tier("C"), Some(HolderTier::Elite));
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty_context() {
        let provider = Arc::new(FakeProvider::failing(LockeError::ProviderStatus {
            status: 502,
            body: "bad gateway".into(),
        }));
        let refresher = ContextRefresher::new(provider);

        let ctx = refresher.refresh_context(WALLET, Chain::Solana).await;
        assert!(ctx.holdings.is_empty());

        let report = refresher.refresh(WALLET, Chain::Solana).await;
        assert!(report.is_degraded());
        match report.status {
            ProviderStatus::Unavailable { reason } => assert!(reason.contains("502")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_provider_failure() {
        let provider = Arc::new(FakeProvider {
            delay: Some(Duration::from_secs(5)),
            ..FakeProvider::with(vec![raw("A", 1.0, None)])
        });
        let config = LockeConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        let refresher = ContextRefresher::with_config(provider, &config);

        let report = refresher.refresh(WALLET, Chain::Solana).await;
        assert!(report.context.holdings.is_empty());
        assert_eq!(
            report.status,
            ProviderStatus::Unavailable {
                reason: LockeError::ProviderTimeout(0).to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_address_skips_provider() {
        let provider = Arc::new(FakeProvider::with(vec![raw("A", 1.0, None)]));
        let refresher = ContextRefresher::new(provider.clone());

        let report = refresher.refresh("not a wallet", Chain::Solana).await;
        assert!(report.is_degraded());
        assert!(report.context.holdings.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_chain_holdings_dropped() {
        let mut dot = raw("D", 1.0, None);
        dot.chain = "polkadot".into();
        let mut eth = raw("E", 1.0, None);
        eth.chain = "ethereum".into();
        let provider = Arc::new(FakeProvider::with(vec![raw("A", 1.0, None), dot, eth]));
        let refresher = ContextRefresher::new(provider);

        let report = refresher.refresh(WALLET, Chain::Solana).await;
        assert_eq!(report.status, ProviderStatus::Fetched { holdings: 1 });
        let ctx = report.context;
        assert_eq!(ctx.holdings.len(), 1);
        assert_eq!(ctx.holdings[0].token_address, "A");
    }

    #[tokio::test]
    async fn test_refresh_replaces_wholesale() {
        let refresher = ContextRefresher::new(Arc::new(FakeProvider::with(vec![raw("A", 1.0, None)])));
        let first = refresher.refresh_context(WALLET, Chain::Solana).await;
        let second = refresher.refresh_context(WALLET, Chain::Solana).await;
        assert_eq!(first.holdings, second.holdings);
        assert!(second.refreshed_at >= first.refreshed_at);
    }
}
