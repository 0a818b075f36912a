//! # Rootstock Identity SDK
//!
//! Resolves a Rootstock account address to a human-readable RNS identity and,
//! for stRIF stakers, reconstructs how long tokens have been continuously held.
//!
//! ## Overview
//!
//! Consumers ask two questions about an address: "who is this?" and "how long
//! has it been staking?". Answering them takes several independent sources:
//!
//! - **Registry**: the on-chain RNS reverse record (`<addr>.addr.reverse`)
//! - **Indexers**: off-chain name records and transaction history (Blockscout)
//! - **Staking token**: stRIF balance, total supply and voting power
//! - **Price**: USD quote for the staked balance
//!
//! All sources for one request are queried concurrently. Any source may fail;
//! its answer then degrades to "no match" (or zero) without affecting the others.
//!
//! ## Architecture
//!
//! ### Resolution Layer
//! [`name_resolution::NameResolutionAggregator`] merges the registry and indexer
//! answers by a fixed precedence: concrete name, then inferred registration, then none.
//!
//! ### Indexer Layer
//! [`paginated_indexer::PaginatedIndexerClient`] follows cursors with a bounded,
//! traversal-wide retry budget. Indexer specifics live in [`indexers`].
//!
//! ### Analytics Layer
//! [`holding_period`] replays the staking event log into holding intervals;
//! [`price_cache::PriceQuoteCache`] keeps a TTL-bounded USD quote.
//!
//! ### Composition
//! [`service::IdentityAndStakingService`] validates input and runs the fan-out.

// Core Types
/// Domain types and response DTOs
pub mod types;
/// Error taxonomy
pub mod error;
/// Address validation and reverse-record keys
pub mod address;

// Sources
/// Smart contract ABIs (read-only views)
pub mod contracts;
/// On-chain RNS registry access
pub mod registry;
/// Staking token reads
pub mod staking;
/// Generic cursor-following indexer client
pub mod paginated_indexer;
/// Concrete indexer adapters
pub mod indexers;

// Aggregation & Analytics
/// Multi-source name resolution
pub mod name_resolution;
/// Holding period reconstruction
pub mod holding_period;
/// USD price quote cache
pub mod price_cache;
/// Composition root
pub mod service;

// Infrastructure
/// Metrics and observability
pub mod metrics;

// Settings & Configuration
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use error::{SourceError, ValidationError};
pub use name_resolution::NameResolutionAggregator;
pub use paginated_indexer::PaginatedIndexerClient;
pub use price_cache::PriceQuoteCache;
pub use service::IdentityAndStakingService;
pub use settings::Settings;
