//! ============================================================================
//! Bags API Client - Wallet holdings and token metrics over HTTP
//! ============================================================================
//! Endpoints:
//! - GET {base}/v1/holdings/{chain}/{wallet}
//! - GET {base}/v1/tokens/{chain}/{token}/metrics
//! Requests carry `Authorization: Bearer <api key>` when a key is set.
//! ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{BalanceProvider, ProviderHolding, TokenMetrics};
use crate::config::{LockeConfig, DEFAULT_TIMEOUT_SECS};
use crate::engine::evaluate_rule;
use crate::error::{LockeError, Result};
use crate::types::{Chain, GateRule, HoldingsContext, RuleKind, TokenHolding};

#[derive(Debug, Deserialize)]
struct HoldingsResponse {
    #[serde(default)]
    holdings: Option<Vec<ProviderHolding>>,
}

/// HTTP client for the Bags balance API
pub struct BagsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LockeError::Config(format!("Failed to build HTTP client: {}", e)))
}

impl BagsClient {
    /// Create a client for the given base URL with the default timeout
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Create a client from engine configuration
    pub fn from_config(config: &LockeConfig) -> Result<Self> {
        if config.api_key.is_none() {
            warn!("BAGS_API_KEY not set - requests will be unauthenticated");
        }

        Ok(Self {
            client: http_client(config.request_timeout())?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn holdings_url(&self, wallet_address: &str, chain: Chain) -> String {
        format!("{}/v1/holdings/{}/{}", self.base_url, chain, wallet_address)
    }

    fn metrics_url(&self, token_address: &str, chain: Chain) -> String {
        format!("{}/v1/tokens/{}/{}/metrics", self.base_url, chain, token_address)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LockeError::ProviderStatus { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LockeError::ProviderDecode(e.to_string()))
    }

    /// Whether a wallet holds a token, optionally at or above a minimum.
    ///
    /// Fails closed: a malformed address or any provider error counts as
    /// not owning the token.
    pub async fn verify_ownership(
        &self,
        wallet_address: &str,
        token_address: &str,
        chain: Chain,
        minimum_balance: Option<f64>,
    ) -> bool {
        if let Err(e) = chain.validate_address(wallet_address) {
            warn!("Ownership check skipped: {} - denying", e);
            return false;
        }

        match self.get_holdings(wallet_address, chain).await {
            Ok(holdings) => {
                owns_token(wallet_address, holdings, token_address, chain, minimum_balance)
            }
            Err(e) => {
                warn!("Ownership check for {} failed: {} - denying", wallet_address, e);
                false
            }
        }
    }
}

/// Ownership decision over fetched holdings. A matching holding must exist;
/// the balance test reuses the minimum_balance / token_ownership rules.
fn owns_token(
    wallet_address: &str,
    holdings: Vec<ProviderHolding>,
    token_address: &str,
    chain: Chain,
    minimum_balance: Option<f64>,
) -> bool {
    let holdings: Vec<TokenHolding> = holdings
        .into_iter()
        .filter(|h| h.known_chain() == Some(chain))
        .map(|h| TokenHolding {
            token_address: h.token_address,
            chain,
            balance: h.balance,
            tier: None,
        })
        .collect();
    let context = HoldingsContext::new(wallet_address, chain, holdings);

    if context.find_holding(token_address, chain).is_none() {
        return false;
    }

    let token_address = Some(token_address.to_string());
    let kind = match minimum_balance {
        Some(minimum) => RuleKind::MinimumBalance {
            token_address,
            chain: Some(chain),
            minimum_balance: Some(minimum),
        },
        None => RuleKind::TokenOwnership {
            token_address,
            chain: Some(chain),
        },
    };

    evaluate_rule(&GateRule::new("verify_ownership", kind), &context).granted
}

#[async_trait]
impl BalanceProvider for BagsClient {
    async fn get_holdings(&self, wallet_address: &str, chain: Chain) -> Result<Vec<ProviderHolding>> {
        let url = self.holdings_url(wallet_address, chain);
        let response: HoldingsResponse = self.get_json(&url).await?;
        let holdings = response.holdings.unwrap_or_default();

        info!(
            "Fetched {} holdings for {} on {}",
            holdings.len(),
            wallet_address,
            chain
        );

        Ok(holdings)
    }

    async fn get_token_metrics(&self, token_address: &str, chain: Chain) -> Option<TokenMetrics> {
        let url = self.metrics_url(token_address, chain);
        match self.get_json::<TokenMetrics>(&url).await {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!("Failed to fetch token metrics for {}: {}", token_address, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "8i51XNNpGaKaj4G4nDdmQh95v4FKAxw8mhtaRoKd9tE8";

    fn holding(token: &str, balance: f64, chain: &str) -> ProviderHolding {
        ProviderHolding {
            token_address: token.into(),
            balance,
            chain: chain.into(),
            holder_rank: None,
            last_updated: None,
        }
    }

    #[test]
    fn test_client_urls() {
        let client = BagsClient::new("https://api.bags.dev/", Some("key".into())).unwrap();
        assert_eq!(client.base_url(), "https://api.bags.dev");
        assert_eq!(
            client.holdings_url("W", Chain::Solana),
            "https://api.bags.dev/v1/holdings/solana/W"
        );
        assert_eq!(
            client.metrics_url("T", Chain::Polkadot),
            "https://api.bags.dev/v1/tokens/polkadot/T/metrics"
        );
    }

    #[test]
    fn test_client_from_config() {
        let config = LockeConfig {
            api_url: "http://localhost:9000".into(),
            ..Default::default()
        };
        let client = BagsClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_holdings_response_parsing() {
        let body = r#"{"holdings":[{"token_address":"T","balance":500,"chain":"solana","holder_rank":42,"last_updated":"2024-05-01T12:00:00Z"}]}"#;
        let parsed: HoldingsResponse = serde_json::from_str(body).unwrap();
        let holdings = parsed.holdings.unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].balance, 500.0);
        assert_eq!(holdings[0].holder_rank, Some(42));
        assert_eq!(holdings[0].known_chain(), Some(Chain::Solana));
        assert_eq!(holdings[0].last_updated.as_deref(), Some("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_mixed_response_keeps_valid_holdings() {
        let body = r#"{"holdings":[
            {"token_address":"T","balance":5000,"chain":"solana","last_updated":"1714564800"},
            {"token_address":"E","balance":1,"chain":"ethereum","last_updated":"yesterday"}
        ]}"#;
        let parsed: HoldingsResponse = serde_json::from_str(body).unwrap();
        let holdings = parsed.holdings.unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[1].known_chain(), None);

        assert!(owns_token(WALLET, holdings.clone(), "T", Chain::Solana, Some(1000.0)));
        assert!(!owns_token(WALLET, holdings, "E", Chain::Solana, None));
    }

    #[test]
    fn test_missing_holdings_field_is_empty() {
        let parsed: HoldingsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.holdings.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_owns_token_requires_a_holding() {
        assert!(!owns_token(WALLET, vec![], "T", Chain::Solana, Some(0.0)));
        assert!(owns_token(
            WALLET,
            vec![holding("T", 0.0, "solana")],
            "T",
            Chain::Solana,
            Some(0.0)
        ));
        assert!(!owns_token(
            WALLET,
            vec![holding("T", 0.0, "solana")],
            "T",
            Chain::Solana,
            None
        ));
        assert!(!owns_token(
            WALLET,
            vec![holding("T", 10.0, "polkadot")],
            "T",
            Chain::Solana,
            None
        ));
    }

    #[tokio::test]
    async fn test_verify_ownership_rejects_malformed_address() {
        let client = BagsClient::new("http://127.0.0.1:9", None).unwrap();
        assert!(!client.verify_ownership("not a wallet", "T", Chain::Solana, None).await);
    }

    #[tokio::test]
    async fn test_verify_ownership_fails_closed_when_unreachable() {
        // Nothing listens on port 9 locally
        let client = BagsClient::new("http://127.0.0.1:9", None).unwrap();
        assert!(!client.verify_ownership(WALLET, "T", Chain::Solana, None).await);
    }
}
