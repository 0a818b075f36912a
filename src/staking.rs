//! Read-only access to the staking token (stRIF).

use crate::contracts::StakedRif;
use crate::error::SourceError;
use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use std::sync::Arc;

#[async_trait]
pub trait StakingTokenReader: Send + Sync {
    async fn balance_of(&self, account: Address) -> Result<U256, SourceError>;
    async fn total_supply(&self) -> Result<U256, SourceError>;
    async fn get_votes(&self, account: Address) -> Result<U256, SourceError>;

    /// Address of the staking contract, used to filter the transaction log.
    fn contract_address(&self) -> Address;
}

pub struct EthersStakingReader<M> {
    token: StakedRif<M>,
}

impl<M: Middleware + 'static> EthersStakingReader<M> {
    pub fn new(provider: Arc<M>, token_address: Address) -> Self {
        Self {
            token: StakedRif::new(token_address, provider),
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> StakingTokenReader for EthersStakingReader<M> {
    async fn balance_of(&self, account: Address) -> Result<U256, SourceError> {
        self.token
            .balance_of(account)
            .call()
            .await
            .map_err(SourceError::from_contract)
    }

    async fn total_supply(&self) -> Result<U256, SourceError> {
        self.token
            .total_supply()
            .call()
            .await
            .map_err(SourceError::from_contract)
    }

    async fn get_votes(&self, account: Address) -> Result<U256, SourceError> {
        self.token
            .get_votes(account)
            .call()
            .await
            .map_err(SourceError::from_contract)
    }

    fn contract_address(&self) -> Address {
        self.token.address()
    }
}
