//! # Name Resolution Aggregator
//!
//! Resolves an address to an RNS name by querying the on-chain registry and any
//! number of off-chain indexers concurrently, then merging their answers.
//!
//! ## Precedence
//!
//! Answers are ranked, strongest first:
//!
//! 1. A concrete name, taking the first source in query order (the registry is
//!    always queried first, indexers follow in configured order).
//! 2. Inferred registration (contract-interaction evidence without a name).
//! 3. No match.
//!
//! ## Failure isolation
//!
//! Every source failure (transport, malformed payload, revert) is logged and
//! counted as "no match" for that source only. Resolution itself cannot fail.

use crate::address::reverse_node;
use crate::error::SourceError;
use crate::metrics;
use crate::registry::RegistryReader;
use crate::types::{AddressIdentity, IdentitySource, NameMatch};
use async_trait::async_trait;
use ethers::types::Address;
use futures::future::join_all;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

/// An off-chain identity source.
#[async_trait]
pub trait NameIndexer: Send + Sync {
    fn source(&self) -> IdentitySource;

    async fn lookup(&self, address: Address) -> Result<NameMatch, SourceError>;
}

/// One source's answer after its errors were collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAnswer {
    pub source: IdentitySource,
    pub result: NameMatch,
}

/// Merge answers given in query order. First concrete name wins, then any inferred
/// evidence, otherwise unregistered.
pub fn merge_answers(address: Address, answers: &[SourceAnswer]) -> AddressIdentity {
    if let Some((source, name)) = answers.iter().find_map(|a| match &a.result {
        NameMatch::Named(name) => Some((a.source, name.clone())),
        _ => None,
    }) {
        return AddressIdentity {
            address,
            name: Some(name),
            registered: true,
            source: Some(source),
        };
    }

    if answers.iter().any(|a| a.result == NameMatch::Inferred) {
        return AddressIdentity {
            address,
            name: None,
            registered: true,
            source: Some(IdentitySource::Inferred),
        };
    }

    AddressIdentity::unregistered(address)
}

pub struct NameResolutionAggregator {
    registry: Arc<dyn RegistryReader>,
    indexers: Vec<Arc<dyn NameIndexer>>,
}

impl NameResolutionAggregator {
    pub fn new(registry: Arc<dyn RegistryReader>) -> Self {
        Self {
            registry,
            indexers: Vec::new(),
        }
    }

    /// Append an indexer; query order is registration order.
    pub fn with_indexer(mut self, indexer: Arc<dyn NameIndexer>) -> Self {
        self.indexers.push(indexer);
        self
    }

    pub fn indexer_count(&self) -> usize {
        self.indexers.len()
    }

    pub async fn resolve(&self, address: Address) -> AddressIdentity {
        let registry = async {
            let start = Instant::now();
            let result = self.lookup_registry(address).await;
            collapse(IdentitySource::Registry, address, result, start)
        };
        let indexers = join_all(self.indexers.iter().map(|indexer| async move {
            let start = Instant::now();
            let result = indexer.lookup(address).await;
            collapse(indexer.source(), address, result, start)
        }));

        let (registry_answer, indexer_answers) = futures::join!(registry, indexers);

        let mut answers = Vec::with_capacity(1 + indexer_answers.len());
        answers.push(registry_answer);
        answers.extend(indexer_answers);

        let identity = merge_answers(address, &answers);
        debug!(
            "resolved {:?}: registered={} source={:?}",
            address, identity.registered, identity.source
        );
        identity
    }

    async fn lookup_registry(&self, address: Address) -> Result<NameMatch, SourceError> {
        let node = reverse_node(&address);
        let resolver = self.registry.resolver(node).await?;
        if resolver.is_zero() {
            return Ok(NameMatch::NoMatch);
        }
        let name = self.registry.name(resolver, node).await?;
        Ok(NameMatch::from_name(Some(name)))
    }
}

fn collapse(
    source: IdentitySource,
    address: Address,
    result: Result<NameMatch, SourceError>,
    start: Instant,
) -> SourceAnswer {
    metrics::record_source_latency(source.as_str(), start.elapsed());
    let result = match result {
        Ok(found) => found,
        Err(e) => {
            warn!("{} lookup for {:?} failed: {}", source.as_str(), address, e);
            metrics::increment_source_outcome(source.as_str(), "error");
            return SourceAnswer {
                source,
                result: NameMatch::NoMatch,
            };
        }
    };
    metrics::increment_source_outcome(source.as_str(), result.as_str());
    SourceAnswer { source, result }
}
