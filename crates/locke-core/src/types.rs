//! ============================================================================
//! Core Types for the Locke Engine
//! ============================================================================
//! Chains, holder tiers, holdings snapshots, gate rules and evaluations.
//! These types are serialized to JSON for rule files and for the
//! presentation layer that renders locked/unlocked content.
//! ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::LockeError;

// ============================================================================
// Chains
// ============================================================================

/// Blockchain networks the Bags API indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Polkadot,
}

impl Chain {
    /// Path segment / wire name for this chain
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Polkadot => "polkadot",
        }
    }

    /// Sanity-check a wallet address for this chain.
    ///
    /// Solana addresses are base58 encoded 32-byte public keys. Polkadot
    /// SS58 addresses are base58 with a 1-2 byte network prefix and a 2 byte
    /// checksum around the 32-byte key.
    pub fn validate_address(&self, address: &str) -> Result<(), LockeError> {
        let invalid = || LockeError::InvalidAddress {
            chain: *self,
            address: address.to_string(),
        };

        let bytes = bs58::decode(address).into_vec().map_err(|_| invalid())?;
        let ok = match self {
            Chain::Solana => bytes.len() == 32,
            Chain::Polkadot => matches!(bytes.len(), 35 | 36),
        };

        if ok {
            Ok(())
        } else {
            Err(invalid())
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = LockeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solana" | "sol" => Ok(Chain::Solana),
            "polkadot" | "dot" => Ok(Chain::Polkadot),
            other => Err(LockeError::Config(format!(
                "Unknown chain '{}'. Valid values: solana, polkadot",
                other
            ))),
        }
    }
}

// ============================================================================
// Holder Tiers
// ============================================================================

/// Coarse classification of how significant a holding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HolderTier {
    /// Any non-whale position
    #[default]
    Holder,
    /// Large position or top-100 holder
    Whale,
    /// Very large position or top-10 holder
    Elite,
}

impl HolderTier {
    /// Get the numeric level for comparison
    fn level(&self) -> u8 {
        match self {
            HolderTier::Holder => 1,
            HolderTier::Whale => 2,
            HolderTier::Elite => 3,
        }
    }

    /// Wire / display name (lowercase, used in requirement messages)
    pub fn as_str(&self) -> &'static str {
        match self {
            HolderTier::Holder => "holder",
            HolderTier::Whale => "whale",
            HolderTier::Elite => "elite",
        }
    }

    /// The tier above this one, if any
    pub fn next(&self) -> Option<HolderTier> {
        match self {
            HolderTier::Holder => Some(HolderTier::Whale),
            HolderTier::Whale => Some(HolderTier::Elite),
            HolderTier::Elite => None,
        }
    }
}

impl PartialOrd for HolderTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HolderTier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level().cmp(&other.level())
    }
}

impl fmt::Display for HolderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HolderTier {
    type Err = LockeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "holder" => Ok(HolderTier::Holder),
            "whale" => Ok(HolderTier::Whale),
            "elite" => Ok(HolderTier::Elite),
            other => Err(LockeError::Config(format!(
                "Unknown tier '{}'. Valid values: holder, whale, elite",
                other
            ))),
        }
    }
}

// ============================================================================
// Holdings
// ============================================================================

/// One wallet's position in one token on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub token_address: String,
    pub chain: Chain,
    pub balance: f64,
    /// Derived tier; evaluators treat a missing tier as `holder`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<HolderTier>,
}

/// Snapshot of everything known about a wallet's holdings.
/// Replaced wholesale on refresh, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsContext {
    pub wallet_address: String,
    pub chain: Chain,
    #[serde(default)]
    pub holdings: Vec<TokenHolding>,
    #[serde(default = "Utc::now")]
    pub refreshed_at: DateTime<Utc>,
}

impl HoldingsContext {
    /// Build a context from already-classified holdings
    pub fn new(wallet_address: impl Into<String>, chain: Chain, holdings: Vec<TokenHolding>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            chain,
            holdings,
            refreshed_at: Utc::now(),
        }
    }

    /// A context with no holdings (what a failed refresh produces)
    pub fn empty(wallet_address: impl Into<String>, chain: Chain) -> Self {
        Self::new(wallet_address, chain, Vec::new())
    }

    /// Find the holding for a token on a chain
    pub fn find_holding(&self, token_address: &str, chain: Chain) -> Option<&TokenHolding> {
        self.holdings
            .iter()
            .find(|h| h.token_address == token_address && h.chain == chain)
    }
}

// ============================================================================
// Gate Rules
// ============================================================================

/// A configured access condition, authored by the content creator.
///
/// JSON shape: `{"id": "r1", "rule_type": "minimum_balance",
/// "token_address": "...", "chain": "solana", "minimum_balance": 1000}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRule {
    pub id: String,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl GateRule {
    pub fn new(id: impl Into<String>, kind: RuleKind) -> Self {
        Self { id: id.into(), kind }
    }
}

/// Rule variants. Fields are optional so incomplete rules still load and
/// evaluate to a misconfiguration instead of failing the whole rule set.
/// `chain` is required by every holding-based variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Any non-zero balance of the token
    TokenOwnership {
        #[serde(default)]
        token_address: Option<String>,
        #[serde(default)]
        chain: Option<Chain>,
    },
    /// Balance at or above a threshold
    MinimumBalance {
        #[serde(default)]
        token_address: Option<String>,
        #[serde(default)]
        chain: Option<Chain>,
        #[serde(default)]
        minimum_balance: Option<f64>,
    },
    /// Holder tier at or above a threshold
    HolderTier {
        #[serde(default)]
        token_address: Option<String>,
        #[serde(default)]
        chain: Option<Chain>,
        #[serde(default)]
        required_tier: Option<HolderTier>,
    },
    /// Boolean expression over sub-rules (no grammar defined yet)
    Combined {
        #[serde(default)]
        custom_logic: Option<serde_json::Value>,
    },
    /// Any rule_type this engine does not know
    #[serde(other)]
    Unknown,
}

/// How a rule set is combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateOperator {
    #[default]
    And,
    Or,
}

impl FromStr for GateOperator {
    type Err = LockeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AND" | "ALL" => Ok(GateOperator::And),
            "OR" | "ANY" => Ok(GateOperator::Or),
            other => Err(LockeError::Config(format!(
                "Unknown operator '{}'. Valid values: AND, OR",
                other
            ))),
        }
    }
}

// ============================================================================
// Evaluations
// ============================================================================

/// Why an evaluation came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// Requirements met
    Granted,
    /// Rule is valid, the wallet does not qualify
    Denied,
    /// Rule is missing fields or has an unknown type
    Misconfigured,
    /// Rule type is recognised but cannot be evaluated yet
    Unsupported,
}

/// Verdict for one rule or a composed rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub granted: bool,
    pub outcome: GateOutcome,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_balance: Option<f64>,
}

impl GateEvaluation {
    fn with_outcome(outcome: GateOutcome, reason: impl Into<String>) -> Self {
        Self {
            granted: outcome == GateOutcome::Granted,
            outcome,
            reason: reason.into(),
            missing_requirements: Vec::new(),
            user_balance: None,
            required_balance: None,
        }
    }

    pub fn granted(reason: impl Into<String>) -> Self {
        Self::with_outcome(GateOutcome::Granted, reason)
    }

    pub fn denied(reason: impl Into<String>, missing_requirements: Vec<String>) -> Self {
        Self {
            missing_requirements,
            ..Self::with_outcome(GateOutcome::Denied, reason)
        }
    }

    pub fn misconfigured(reason: impl Into<String>) -> Self {
        Self::with_outcome(GateOutcome::Misconfigured, reason)
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::with_outcome(GateOutcome::Unsupported, reason)
    }

    /// Attach the balance the wallet has
    pub fn with_user_balance(mut self, balance: f64) -> Self {
        self.user_balance = Some(balance);
        self
    }

    /// Attach the balance the rule requires
    pub fn with_required_balance(mut self, balance: f64) -> Self {
        self.required_balance = Some(balance);
        self
    }

    /// True when the rule itself is broken or not evaluable
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.outcome,
            GateOutcome::Misconfigured | GateOutcome::Unsupported
        )
    }
}
