//! # Identity and Staking Service
//!
//! Composition root: validates the address, then fans out to every source
//! (registry, indexers, staking token reads, transaction history, price quote)
//! and joins the results into the response DTOs.
//!
//! Each branch isolates its own failure. Only a malformed address is reported as
//! an error, and it is reported before any outbound call is made.

use crate::address::parse_address;
use crate::error::{SourceError, ValidationError};
use crate::holding_period::{max_holding_days, reconstruct, TransactionLog};
use crate::indexers::{self, blockscout, DirectNameIndexer, RegistrationEvidenceIndexer, TransactionHistory};
use crate::metrics;
use crate::name_resolution::NameResolutionAggregator;
use crate::paginated_indexer::BackoffPolicy;
use crate::price_cache::{Clock, CoinGeckoQuoteSource, PriceQuoteCache, SystemClock};
use crate::registry::EthersRegistryReader;
use crate::settings::Settings;
use crate::staking::{EthersStakingReader, StakingTokenReader};
use crate::types::conversions::{string_to_address, u256_to_f64};
use crate::types::{AddressIdentity, ApiResponse, IdentityResponse, IdentitySource, StakingAnalytics};
use anyhow::Context;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Both halves of a lookup for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressReport {
    pub identity: AddressIdentity,
    pub staking: StakingAnalytics,
}

pub struct IdentityAndStakingService {
    names: NameResolutionAggregator,
    staking: Arc<dyn StakingTokenReader>,
    history: Option<Arc<dyn TransactionLog>>,
    prices: Arc<PriceQuoteCache>,
    clock: Arc<dyn Clock>,
    token_decimals: u32,
    network: String,
}

impl IdentityAndStakingService {
    pub fn new(
        names: NameResolutionAggregator,
        staking: Arc<dyn StakingTokenReader>,
        prices: Arc<PriceQuoteCache>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            names,
            staking,
            history: None,
            prices,
            clock: Arc::new(SystemClock),
            token_decimals: 18,
            network: network.into(),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn TransactionLog>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_token_decimals(mut self, decimals: u32) -> Self {
        self.token_decimals = decimals;
        self
    }

    /// Wire the production stack: ethers HTTP provider for the registry and staking
    /// token, Blockscout for history and registration evidence, CoinGecko for price.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let rpc_http = indexers::http_client(Duration::from_millis(settings.rpc.timeout_ms))
            .context("failed to build RPC HTTP client")?;
        let rpc_url = url::Url::parse(&settings.rpc.url)
            .with_context(|| format!("invalid rpc url {}", settings.rpc.url))?;
        let provider = Arc::new(Provider::new(Http::new_with_client(rpc_url, rpc_http)));

        let registry_address = string_to_address(&settings.contracts.rns_registry)
            .context("invalid contracts.rns_registry")?;
        let staking_address = string_to_address(&settings.contracts.staking_token)
            .context("invalid contracts.staking_token")?;
        let registration_contracts = settings
            .contracts
            .registration_contracts
            .iter()
            .map(|raw| string_to_address(raw).with_context(|| format!("invalid registration contract {}", raw)))
            .collect::<anyhow::Result<Vec<Address>>>()?;

        let idx = &settings.indexers;
        let http = indexers::http_client(idx.timeout()).context("failed to build indexer HTTP client")?;

        let mut names =
            NameResolutionAggregator::new(Arc::new(EthersRegistryReader::new(provider.clone(), registry_address)));

        if !idx.name_lookup_url.is_empty() {
            names = names.with_indexer(Arc::new(DirectNameIndexer::new(
                http.clone(),
                idx.name_lookup_url.clone(),
                IdentitySource::IndexerA,
                idx.requests_per_second,
            )?));
        }

        let mut history: Option<Arc<dyn TransactionLog>> = None;
        if !idx.blockscout_url.is_empty() {
            let backoff = BackoffPolicy::new(
                Duration::from_millis(idx.backoff_base_ms),
                Duration::from_millis(idx.backoff_max_ms),
            );
            let client =
                blockscout::blockscout_client(http.clone(), &idx.blockscout_url, idx.requests_per_second, backoff)?;
            names = names.with_indexer(Arc::new(RegistrationEvidenceIndexer::new(
                client.clone(),
                registration_contracts,
                idx.max_retries,
            )));
            history = Some(Arc::new(TransactionHistory::new(client, idx.max_retries)));
        }

        let price_http = indexers::http_client(Duration::from_millis(settings.price.timeout_ms))
            .context("failed to build price HTTP client")?;
        let quotes = Arc::new(CoinGeckoQuoteSource::from_settings(price_http, &settings.price));
        let prices = Arc::new(PriceQuoteCache::from_settings(quotes, &settings.price));

        info!(
            "IdentityAndStakingService: rpc={} indexers={} history={} network={}",
            settings.rpc.url,
            names.indexer_count(),
            history.is_some(),
            settings.service.network
        );

        let mut service = Self::new(
            names,
            Arc::new(EthersStakingReader::new(provider, staking_address)),
            prices,
            settings.service.network.clone(),
        )
        .with_token_decimals(settings.contracts.staking_token_decimals);
        if let Some(history) = history {
            service = service.with_history(history);
        }
        Ok(service)
    }

    pub async fn resolve_identity(&self, raw_address: &str) -> Result<AddressIdentity, ValidationError> {
        let address = parse_address(raw_address)?;
        Ok(self.names.resolve(address).await)
    }

    pub async fn staking_analytics(&self, raw_address: &str) -> Result<StakingAnalytics, ValidationError> {
        let address = parse_address(raw_address)?;
        Ok(self.analytics_for(address).await)
    }

    /// Identity and staking analytics, all sources concurrently.
    pub async fn lookup(&self, raw_address: &str) -> Result<AddressReport, ValidationError> {
        let address = parse_address(raw_address)?;
        let (identity, staking) = tokio::join!(self.names.resolve(address), self.analytics_for(address));
        Ok(AddressReport { identity, staking })
    }

    /// `{"data": {"name", "registered"}}` or `{"msg": ...}`.
    pub async fn identity_response(&self, raw_address: &str) -> ApiResponse<IdentityResponse> {
        match self.resolve_identity(raw_address).await {
            Ok(identity) => ApiResponse::Data {
                data: IdentityResponse {
                    name: identity.name,
                    registered: identity.registered,
                },
            },
            Err(e) => ApiResponse::Invalid { msg: e.to_string() },
        }
    }

    pub async fn staking_response(&self, raw_address: &str) -> ApiResponse<StakingAnalytics> {
        match self.staking_analytics(raw_address).await {
            Ok(data) => ApiResponse::Data { data },
            Err(e) => ApiResponse::Invalid { msg: e.to_string() },
        }
    }

    async fn analytics_for(&self, address: Address) -> StakingAnalytics {
        let (staked_balance, total_supply, voting_power, usd_value, holding_period_days) = tokio::join!(
            self.read_amount("balanceOf", self.staking.balance_of(address)),
            self.read_amount("totalSupply", self.staking.total_supply()),
            self.read_amount("getVotes", self.staking.get_votes(address)),
            self.prices.get_usd_value(),
            self.holding_period_days(address),
        );

        StakingAnalytics {
            staked_balance,
            staked_balance_usd: staked_balance * usd_value,
            total_supply,
            voting_power,
            holding_period_days,
            network: self.network.clone(),
        }
    }

    async fn holding_period_days(&self, address: Address) -> i64 {
        let Some(history) = &self.history else {
            return 0;
        };
        let events = history.events(address).await;
        let intervals = reconstruct(&events, self.staking.contract_address());
        max_holding_days(&intervals, self.clock.now())
    }

    /// A failed read is reported as zero.
    async fn read_amount<F>(&self, call: &str, read: F) -> f64
    where
        F: Future<Output = Result<U256, SourceError>>,
    {
        let raw = match read.await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("staking token {} failed: {}", call, e);
                metrics::increment_staking_read_error(call);
                return 0.0;
            }
        };
        u256_to_f64(raw, self.token_decimals).unwrap_or_else(|e| {
            warn!("staking token {} returned unformattable {}: {}", call, raw, e);
            0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_cache::QuoteSource;
    use crate::registry::RegistryReader;
    use crate::types::TransactionEvent;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use ethers::types::H256;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ADDRESS: &str = "0x1111111111111111111111111111111111111111";

    fn staking_contract() -> Address {
        "0x5db91e24bd32059584bbdb831a901f1199f3d459".parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn tokens(whole: u64) -> U256 {
        U256::from(whole) * U256::exp10(18)
    }

    #[derive(Default)]
    struct Calls(AtomicUsize);

    impl Calls {
        fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct FakeRegistry(Arc<Calls>);

    #[async_trait]
    impl RegistryReader for FakeRegistry {
        async fn resolver(&self, _node: H256) -> Result<Address, SourceError> {
            self.0.hit();
            Ok(staking_contract())
        }
        async fn name(&self, _resolver: Address, _node: H256) -> Result<String, SourceError> {
            self.0.hit();
            Ok("alice.rsk".to_string())
        }
    }

    struct FakeToken {
        calls: Arc<Calls>,
        fail_votes: bool,
    }

    #[async_trait]
    impl StakingTokenReader for FakeToken {
        async fn balance_of(&self, _account: Address) -> Result<U256, SourceError> {
            self.calls.hit();
            Ok(tokens(200))
        }
        async fn total_supply(&self) -> Result<U256, SourceError> {
            self.calls.hit();
            Ok(tokens(1_000_000))
        }
        async fn get_votes(&self, _account: Address) -> Result<U256, SourceError> {
            self.calls.hit();
            if self.fail_votes {
                Err(SourceError::Upstream("reverted".into()))
            } else {
                Ok(tokens(150))
            }
        }
        fn contract_address(&self) -> Address {
            staking_contract()
        }
    }

    struct FakeQuotes(Arc<Calls>);

    #[async_trait]
    impl QuoteSource for FakeQuotes {
        async fn fetch_usd(&self) -> Result<f64, SourceError> {
            self.0.hit();
            Ok(0.5)
        }
    }

    struct FakeHistory(Arc<Calls>);

    #[async_trait]
    impl TransactionLog for FakeHistory {
        async fn events(&self, _address: Address) -> Vec<TransactionEvent> {
            self.0.hit();
            vec![TransactionEvent {
                method: "depositAndDelegate".into(),
                counterparty: staking_contract(),
                timestamp: now() - chrono::Duration::days(45),
            }]
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            now()
        }
    }

    fn service(calls: &Arc<Calls>, fail_votes: bool) -> IdentityAndStakingService {
        let names = NameResolutionAggregator::new(Arc::new(FakeRegistry(calls.clone())));
        let token = Arc::new(FakeToken {
            calls: calls.clone(),
            fail_votes,
        });
        let prices = Arc::new(PriceQuoteCache::new(
            Arc::new(FakeQuotes(calls.clone())),
            0.078623,
            chrono::Duration::days(1),
        ));
        IdentityAndStakingService::new(names, token, prices, "mainnet")
            .with_history(Arc::new(FakeHistory(calls.clone())))
            .with_clock(Arc::new(FixedClock))
    }

    #[tokio::test]
    async fn test_lookup_assembles_both_halves() {
        let calls = Arc::new(Calls::default());
        let report = service(&calls, false).lookup(ADDRESS).await.unwrap();

        assert_eq!(report.identity.name.as_deref(), Some("alice.rsk"));
        assert_eq!(report.identity.source, Some(IdentitySource::Registry));
        assert_eq!(
            report.staking,
            StakingAnalytics {
                staked_balance: 200.0,
                staked_balance_usd: 100.0,
                total_supply: 1_000_000.0,
                voting_power: 150.0,
                holding_period_days: 45,
                network: "mainnet".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_read_degrades_to_zero() {
        let calls = Arc::new(Calls::default());
        let analytics = service(&calls, true).staking_analytics(ADDRESS).await.unwrap();
        assert_eq!(analytics.voting_power, 0.0);
        assert_eq!(analytics.staked_balance, 200.0);
    }

    #[tokio::test]
    async fn test_malformed_address_makes_no_outbound_calls() {
        let calls = Arc::new(Calls::default());
        let service = service(&calls, false);

        assert!(matches!(
            service.lookup("not-an-address").await,
            Err(ValidationError::MalformedAddress(_))
        ));
        assert_eq!(
            service.identity_response("not-an-address").await,
            ApiResponse::Invalid {
                msg: "Address is not valid!".into()
            }
        );
        assert!(service.staking_response("0x123").await.is_invalid());
        assert_eq!(calls.count(), 0);
    }

    #[tokio::test]
    async fn test_identity_response_envelope() {
        let calls = Arc::new(Calls::default());
        let response = service(&calls, false).identity_response(ADDRESS).await;
        assert_eq!(
            response,
            ApiResponse::Data {
                data: IdentityResponse {
                    name: Some("alice.rsk".into()),
                    registered: true,
                }
            }
        );
    }
}
