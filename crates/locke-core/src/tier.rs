//! ============================================================================
//! Tier Classifier - Holder tiers from balance and holder rank
//! ============================================================================
//! Default policy:
//! - **Elite**: balance > 1M or rank <= 10
//! - **Whale**: balance > 100K or rank <= 100
//! - **Holder**: everything else
//!
//! Rank can only raise a tier, never lower it below the balance-only tier.
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::types::HolderTier;

/// Balance above which a holding is elite
pub const ELITE_BALANCE_THRESHOLD: f64 = 1_000_000.0;
/// Balance above which a holding is a whale
pub const WHALE_BALANCE_THRESHOLD: f64 = 100_000.0;
/// Holder ranks at or below this are elite
pub const ELITE_RANK_THRESHOLD: u32 = 10;
/// Holder ranks at or below this are whales
pub const WHALE_RANK_THRESHOLD: u32 = 100;

/// Thresholds used to classify holdings, configurable per platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    pub elite_balance: f64,
    pub whale_balance: f64,
    pub elite_rank: u32,
    pub whale_rank: u32,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            elite_balance: ELITE_BALANCE_THRESHOLD,
            whale_balance: WHALE_BALANCE_THRESHOLD,
            elite_rank: ELITE_RANK_THRESHOLD,
            whale_rank: WHALE_RANK_THRESHOLD,
        }
    }
}

impl TierPolicy {
    /// Classify a holding. A rank of 0 counts as "unranked".
    pub fn classify(&self, balance: f64, rank: Option<u32>) -> HolderTier {
        let rank = rank.filter(|r| *r > 0);
        let ranked_within = |limit: u32| rank.is_some_and(|r| r <= limit);

        if balance > self.elite_balance || ranked_within(self.elite_rank) {
            HolderTier::Elite
        } else if balance > self.whale_balance || ranked_within(self.whale_rank) {
            HolderTier::Whale
        } else {
            HolderTier::Holder
        }
    }

    /// Balance a holding must exceed to reach `tier` on balance alone
    pub fn balance_floor(&self, tier: HolderTier) -> f64 {
        match tier {
            HolderTier::Holder => 0.0,
            HolderTier::Whale => self.whale_balance,
            HolderTier::Elite => self.elite_balance,
        }
    }
}

/// Classify with the default policy
pub fn classify_tier(balance: f64, rank: Option<u32>) -> HolderTier {
    TierPolicy::default().classify(balance, rank)
}

/// Balance-only tier with distance to the next one, for progress displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierProgress {
    pub tier: HolderTier,
    pub balance: f64,
    pub balance_formatted: String,
    pub next_tier: Option<HolderTier>,
    /// Tokens needed to strictly exceed the next tier's threshold
    pub tokens_to_next_tier: Option<f64>,
}

impl TierProgress {
    pub fn new(balance: f64, policy: &TierPolicy) -> Self {
        let tier = policy.classify(balance, None);
        let next_tier = tier.next();
        let tokens_to_next_tier = next_tier.map(|next| policy.balance_floor(next) - balance);

        Self {
            tier,
            balance,
            balance_formatted: format_balance(balance),
            next_tier,
            tokens_to_next_tier,
        }
    }
}

/// Format balance with K/M/B suffixes
pub fn format_balance(amount: f64) -> String {
    if amount >= 1_000_000_000.0 {
        format!("{:.2}B", amount / 1_000_000_000.0)
    } else if amount >= 1_000_000.0 {
        format!("{:.2}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("{:.2}K", amount / 1_000.0)
    } else {
        format!("{:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_from_balance() {
        assert_eq!(classify_tier(0.0, None), HolderTier::Holder);
        assert_eq!(classify_tier(50_000.0, None), HolderTier::Holder);
        assert_eq!(classify_tier(100_000.0, None), HolderTier::Holder); // boundary is exclusive
        assert_eq!(classify_tier(100_000.5, None), HolderTier::Whale);
        assert_eq!(classify_tier(1_000_000.0, None), HolderTier::Whale);
        assert_eq!(classify_tier(1_000_001.0, None), HolderTier::Elite);
    }

    #[test]
    fn test_top_ten_rank_is_elite_regardless_of_balance() {
        for rank in 1..=10 {
            assert_eq!(classify_tier(0.0, Some(rank)), HolderTier::Elite);
            assert_eq!(classify_tier(500_000.0, Some(rank)), HolderTier::Elite);
        }
        assert_eq!(classify_tier(0.0, Some(11)), HolderTier::Whale);
        assert_eq!(classify_tier(0.0, Some(100)), HolderTier::Whale);
        assert_eq!(classify_tier(0.0, Some(101)), HolderTier::Holder);
    }

    #[test]
    fn test_rank_never_lowers_tier() {
        let balances = [0.0, 10.0, 99_999.0, 150_000.0, 999_999.0, 2_000_000.0];
        let ranks = [None, Some(1), Some(10), Some(11), Some(100), Some(101), Some(50_000)];
        for balance in balances {
            let base = classify_tier(balance, None);
            for rank in ranks {
                assert!(classify_tier(balance, rank) >= base, "{balance} {rank:?}");
            }
        }
    }

    #[test]
    fn test_zero_rank_treated_as_unranked() {
        assert_eq!(classify_tier(10.0, Some(0)), HolderTier::Holder);
    }

    #[test]
    fn test_custom_policy() {
        let policy = TierPolicy {
            elite_balance: 1_000.0,
            whale_balance: 100.0,
            elite_rank: 1,
            whale_rank: 5,
        };
        assert_eq!(policy.classify(101.0, None), HolderTier::Whale);
        assert_eq!(policy.classify(1_001.0, None), HolderTier::Elite);
        assert_eq!(policy.classify(0.0, Some(5)), HolderTier::Whale);
        assert_eq!(policy.classify(0.0, Some(1)), HolderTier::Elite);
    }

    #[test]
    fn test_tier_progress() {
        let policy = TierPolicy::default();

        let progress = TierProgress::new(40_000.0, &policy);
        assert_eq!(progress.tier, HolderTier::Holder);
        assert_eq!(progress.next_tier, Some(HolderTier::Whale));
        assert_eq!(progress.tokens_to_next_tier, Some(60_000.0));
        assert_eq!(progress.balance_formatted, "40.00K");

        let top = TierProgress::new(5_000_000.0, &policy);
        assert_eq!(top.tier, HolderTier::Elite);
        assert_eq!(top.next_tier, None);
        assert_eq!(top.tokens_to_next_tier, None);
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance(500.0), "500.00");
        assert_eq!(format_balance(1500.0), "1.50K");
        assert_eq!(format_balance(1_500_000.0), "1.50M");
        assert_eq!(format_balance(1_500_000_000.0), "1.50B");
    }
}
