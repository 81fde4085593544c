//! ============================================================================
//! Configuration - Provider endpoint, credentials, timeouts, tier policy
//! ============================================================================
//! Environment variables:
//! - `BAGS_API_URL`                 (default https://api.bags.dev)
//! - `BAGS_API_KEY`
//! - `LOCKE_PROVIDER_TIMEOUT_SECS`  (default 10)
//! - `LOCKE_ELITE_BALANCE`, `LOCKE_WHALE_BALANCE`
//! - `LOCKE_ELITE_RANK`, `LOCKE_WHALE_RANK`
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LockeError, Result};
use crate::tier::TierPolicy;

/// Default Bags API base URL
pub const DEFAULT_API_URL: &str = "https://api.bags.dev";

/// Default timeout for a single provider call
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockeConfig {
    pub api_url: String,
    /// Never written back out
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub tier_policy: TierPolicy,
}

impl Default for LockeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            tier_policy: TierPolicy::default(),
        }
    }
}

impl LockeConfig {
    /// Load from process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup; unset or empty variables
    /// keep their defaults, malformed numbers are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let policy = defaults.tier_policy;

        Ok(Self {
            api_url: get("BAGS_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_key: get("BAGS_API_KEY"),
            request_timeout_secs: parse_var(&get, "LOCKE_PROVIDER_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
            tier_policy: TierPolicy {
                elite_balance: parse_var(&get, "LOCKE_ELITE_BALANCE")?
                    .unwrap_or(policy.elite_balance),
                whale_balance: parse_var(&get, "LOCKE_WHALE_BALANCE")?
                    .unwrap_or(policy.whale_balance),
                elite_rank: parse_var(&get, "LOCKE_ELITE_RANK")?.unwrap_or(policy.elite_rank),
                whale_rank: parse_var(&get, "LOCKE_WHALE_RANK")?.unwrap_or(policy.whale_rank),
            },
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T, F>(get: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| LockeError::Config(format!("{} has invalid value '{}'", key, raw)))
        })
        .transpose()
}
