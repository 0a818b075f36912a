//! On-chain RNS registry access.
//!
//! The aggregator only needs two read calls, so the RPC transport sits behind
//! [`RegistryReader`]; [`EthersRegistryReader`] is the production implementation
//! over any ethers [`Middleware`].

use crate::contracts::{RnsNameResolver, RnsRegistry};
use crate::error::SourceError;
use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::types::{Address, H256};
use std::sync::Arc;

#[async_trait]
pub trait RegistryReader: Send + Sync {
    /// Resolver contract bound to `node`. The zero address means "no resolver".
    async fn resolver(&self, node: H256) -> Result<Address, SourceError>;

    /// Name stored for `node` on `resolver`.
    async fn name(&self, resolver: Address, node: H256) -> Result<String, SourceError>;
}

pub struct EthersRegistryReader<M> {
    provider: Arc<M>,
    registry: RnsRegistry<M>,
}

impl<M: Middleware + 'static> EthersRegistryReader<M> {
    pub fn new(provider: Arc<M>, registry_address: Address) -> Self {
        let registry = RnsRegistry::new(registry_address, provider.clone());
        Self { provider, registry }
    }
}

#[async_trait]
impl<M: Middleware + 'static> RegistryReader for EthersRegistryReader<M> {
    async fn resolver(&self, node: H256) -> Result<Address, SourceError> {
        self.registry
            .resolver(node.to_fixed_bytes())
            .call()
            .await
            .map_err(SourceError::from_contract)
    }

    async fn name(&self, resolver: Address, node: H256) -> Result<String, SourceError> {
        RnsNameResolver::new(resolver, self.provider.clone())
            .name(node.to_fixed_bytes())
            .call()
            .await
            .map_err(SourceError::from_contract)
    }
}
