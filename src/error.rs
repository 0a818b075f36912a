//! # Error Types
//!
//! Source-level failures are kept as explicit values inside the SDK and only
//! collapsed to "no match" at each source's boundary. The only error that ever
//! reaches a caller is [`ValidationError`].

use ethers::contract::ContractError;
use ethers::providers::Middleware;
use thiserror::Error;

/// Failure of a single upstream source (registry, indexer, price API).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Transport failure: connection refused, DNS, timeout, provider error.
    #[error("network error: {0}")]
    Network(String),
    /// Upstream answered but the answer is unusable: non-2xx, malformed payload, revert.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// The paginated client ran out of its traversal-wide retry budget.
    #[error("retries exhausted after {retries} retries (last error: {last})")]
    RetriesExhausted { retries: u32, last: String },
}

impl SourceError {
    /// Short label used for metrics and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Network(_) => "network",
            SourceError::Upstream(_) => "upstream",
            SourceError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// Classify an ethers contract call failure.
    pub fn from_contract<M: Middleware>(err: ContractError<M>) -> Self {
        match err {
            ContractError::Revert(data) => {
                SourceError::Upstream(format!("call reverted (0x{})", hex::encode(&data)))
            }
            ContractError::MiddlewareError { e } => SourceError::Network(e.to_string()),
            ContractError::ProviderError { e } => SourceError::Network(e.to_string()),
            other => SourceError::Upstream(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_status() || err.is_decode() {
            SourceError::Upstream(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

/// Input rejected before any outbound call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Address is not valid!")]
    MalformedAddress(String),
}
