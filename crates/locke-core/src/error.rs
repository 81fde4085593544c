//! ============================================================================
//! Error Types - Failures of the provider and configuration layers
//! ============================================================================
//! Rule evaluation never fails: misconfigured rules come back as a denied
//! `GateEvaluation`. These errors only cover talking to the balance
//! provider, validating wallet input and loading configuration.
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::types::Chain;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LockeError>;

/// Error types for the Locke engine
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum LockeError {
    #[error("Balance provider request failed: {0}")]
    ProviderRequest(String),

    #[error("Balance provider returned {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Failed to decode provider response: {0}")]
    ProviderDecode(String),

    #[error("Balance provider timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Invalid {chain} wallet address: {address}")]
    InvalidAddress { chain: Chain, address: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LockeError {
    /// Whether the error came from the balance provider itself
    /// (as opposed to bad input or configuration)
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            LockeError::ProviderRequest(_)
                | LockeError::ProviderStatus { .. }
                | LockeError::ProviderDecode(_)
                | LockeError::ProviderTimeout(_)
        )
    }
}

impl From<reqwest::Error> for LockeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LockeError::ProviderDecode(e.to_string())
        } else {
            LockeError::ProviderRequest(e.to_string())
        }
    }
}
