//! ============================================================================
//! LOCKE-CORE: Token-Gating Engine
//! ============================================================================
//! Decides whether a wallet may view gated content based on its on-chain
//! token holdings:
//! - Tier classification from balance and holder rank
//! - Gate rule evaluation (ownership, minimum balance, holder tier)
//! - AND/OR composition of rule sets
//! - Holdings refresh from the Bags balance API (fail closed)
//! - Per-session evaluation cache invalidated on refresh
//! ============================================================================

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod provider;
pub mod refresher;
pub mod session;
pub mod tier;
pub mod types;

// Re-export main types for convenience
pub use cache::EvaluationCache;
pub use config::LockeConfig;
pub use engine::{evaluate_rule, evaluate_rules};
pub use error::{LockeError, Result};
pub use provider::{BagsClient, BalanceProvider, ProviderHolding, TokenMetrics};
pub use refresher::{ContextRefresher, ProviderStatus, RefreshReport};
pub use session::GateSession;
pub use tier::{classify_tier, format_balance, TierPolicy, TierProgress};
pub use types::*;
