//! # Indexer Adapters
//!
//! HTTP adapters for off-chain indexers. Each adapter owns its request shape and
//! pagination scheme; the traversal logic lives in
//! [`crate::paginated_indexer::PaginatedIndexerClient`].
//!
//! - [`blockscout`]: paged transaction history (`/api/v2/addresses/{addr}/transactions`),
//!   used both as registration evidence and as the staking event log.
//! - [`name_lookup`]: direct address -> name record lookup.

pub mod blockscout;
pub mod name_lookup;

pub use blockscout::{BlockscoutTransactions, RegistrationEvidenceIndexer, TransactionHistory};
pub use name_lookup::DirectNameIndexer;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket shared by all requests to one indexer. `0` disables limiting.
pub(crate) fn rate_limiter(requests_per_second: u32) -> Option<Arc<DirectRateLimiter>> {
    NonZeroU32::new(requests_per_second)
        .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

/// Shared HTTP client for indexer adapters.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("rootstock-identity-sdk/", env!("CARGO_PKG_VERSION")))
        .build()
}
