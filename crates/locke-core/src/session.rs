//! ============================================================================
//! Gate Session - Current holdings context plus its evaluation cache
//! ============================================================================
//! The presentation layer holds one session per connected wallet. Replacing
//! the context and clearing the cache happen under the same write lock, and
//! evaluations read the cache while holding the read lock, so a cached
//! verdict can never outlive the context it was computed against.
//! ============================================================================

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::EvaluationCache;
use crate::engine::{compose, evaluate_rule};
use crate::refresher::{ContextRefresher, RefreshReport};
use crate::types::{Chain, GateEvaluation, GateOperator, GateRule, HoldingsContext};

/// Per-wallet gating state
pub struct GateSession {
    refresher: ContextRefresher,
    context: RwLock<Option<HoldingsContext>>,
    cache: EvaluationCache,
}

impl GateSession {
    /// Create a session with no context yet
    pub fn new(refresher: ContextRefresher) -> Self {
        Self {
            refresher,
            context: RwLock::new(None),
            cache: EvaluationCache::new(),
        }
    }

    /// Fetch fresh holdings and swap them in, invalidating cached verdicts
    pub async fn refresh(&self, wallet_address: &str, chain: Chain) -> RefreshReport {
        let report = self.refresher.refresh(wallet_address, chain).await;
        self.replace_context(Some(report.context.clone())).await;
        report
    }

    /// Install a caller-built context, invalidating cached verdicts
    pub async fn set_context(&self, context: HoldingsContext) {
        self.replace_context(Some(context)).await;
    }

    /// Forget the wallet entirely (disconnect)
    pub async fn reset(&self) {
        self.replace_context(None).await;
    }

    async fn replace_context(&self, context: Option<HoldingsContext>) {
        let mut current = self.context.write().await;
        *current = context;
        let dropped = self.cache.clear().await;
        info!(
            "Holdings context replaced ({}), dropped {} cached evaluations",
            current
                .as_ref()
                .map(|c| c.wallet_address.as_str())
                .unwrap_or("none"),
            dropped
        );
    }

    /// Snapshot of the current context
    pub async fn context(&self) -> Option<HoldingsContext> {
        self.context.read().await.clone()
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// Evaluate a content item's rules against the current context.
    ///
    /// Without a context every rule is evaluated against empty holdings and
    /// nothing is cached.
    pub async fn evaluate(&self, rules: &[GateRule], operator: GateOperator) -> GateEvaluation {
        let current = self.context.read().await;

        let Some(context) = current.as_ref() else {
            debug!("No holdings context - evaluating {} rules fail closed", rules.len());
            // No holdings to match, so the chain is irrelevant
            let empty = HoldingsContext::empty("", Chain::Solana);
            let evaluations: Vec<GateEvaluation> =
                rules.iter().map(|rule| evaluate_rule(rule, &empty)).collect();
            return compose(&evaluations, operator);
        };

        let mut evaluations = Vec::with_capacity(rules.len());
        for rule in rules {
            let evaluation = match self.cache.get(&rule.id).await {
                Some(cached) => cached,
                None => {
                    let fresh = evaluate_rule(rule, context);
                    self.cache.put(&rule.id, fresh.clone()).await;
                    fresh
                }
            };
            evaluations.push(evaluation);
        }

        compose(&evaluations, operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresher::tests::{raw, FakeProvider, WALLET};
    use crate::types::RuleKind;
    use std::sync::Arc;

    fn min_rule(id: &str, minimum: f64) -> GateRule {
        GateRule::new(
            id,
            RuleKind::MinimumBalance {
                token_address: Some("T".into()),
                chain: Some(Chain::Solana),
                minimum_balance: Some(minimum),
            },
        )
    }

    fn session_with(balance: f64) -> GateSession {
        let provider = Arc::new(FakeProvider::with(vec![raw("T", balance, None)]));
        GateSession::new(ContextRefresher::new(provider))
    }

    #[tokio::test]
    async fn test_evaluate_without_context_fails_closed() {
        let session = session_with(500.0);
        let eval = session.evaluate(&[min_rule("r1", 1.0)], GateOperator::And).await;
        assert!(!eval.granted);
        assert!(session.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_evaluate_populates_cache() {
        let session = session_with(500.0);
        session.refresh(WALLET, Chain::Solana).await;

        let eval = session.evaluate(&[min_rule("r1", 1000.0)], GateOperator::And).await;
        assert!(!eval.granted);
        assert_eq!(
            eval.missing_requirements,
            vec!["Hold at least 1000 tokens (you have 500)".to_string()]
        );

        let cached = session.cache().get("r1").await.unwrap();
        assert_eq!(cached.user_balance, Some(500.0));
        assert_eq!(cached.required_balance, Some(1000.0));
    }

    #[tokio::test]
    async fn test_context_change_invalidates_cache() {
        let session = session_with(500.0);
        session.refresh(WALLET, Chain::Solana).await;
        let rules = [min_rule("r1", 1000.0)];
        assert!(!session.evaluate(&rules, GateOperator::And).await.granted);

        // Balance goes up; the stale deny must not be served
        let richer = HoldingsContext::new(
            WALLET,
            Chain::Solana,
            vec![crate::types::TokenHolding {
                token_address: "T".into(),
                chain: Chain::Solana,
                balance: 2000.0,
                tier: None,
            }],
        );
        session.set_context(richer).await;
        assert!(session.cache().get("r1").await.is_none());
        assert!(session.evaluate(&rules, GateOperator::And).await.granted);
    }

    #[tokio::test]
    async fn test_refresh_clears_cache() {
        let session = session_with(500.0);
        session.refresh(WALLET, Chain::Solana).await;
        session.evaluate(&[min_rule("r1", 1.0)], GateOperator::And).await;
        assert_eq!(session.cache().len().await, 1);

        let report = session.refresh(WALLET, Chain::Solana).await;
        assert!(!report.is_degraded());
        assert!(session.cache().is_empty().await);
        assert_eq!(session.context().await.unwrap().holdings.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_drops_context() {
        let session = session_with(500.0);
        session.refresh(WALLET, Chain::Solana).await;
        session.reset().await;
        assert!(session.context().await.is_none());
    }
}
