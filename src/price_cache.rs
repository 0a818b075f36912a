// src/price_cache.rs

use crate::error::SourceError;
use crate::metrics;
use crate::settings::PriceSettings;
use crate::types::PriceQuote;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of "now", injectable so staleness can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Upstream USD price for the staking token.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_usd(&self) -> Result<f64, SourceError>;
}

/// CoinGecko `simple/price` endpoint.
pub struct CoinGeckoQuoteSource {
    client: reqwest::Client,
    api_url: String,
    token_id: String,
}

// CoinGecko devuelve { "<token id>": { "usd": price } }
type CoinGeckoPriceResponse = HashMap<String, CoinGeckoTokenPrice>;

#[derive(Debug, Deserialize)]
struct CoinGeckoTokenPrice {
    usd: Option<f64>,
}

impl CoinGeckoQuoteSource {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token_id: token_id.into(),
        }
    }

    pub fn from_settings(client: reqwest::Client, settings: &PriceSettings) -> Self {
        Self::new(client, settings.api_url.clone(), settings.token_id.clone())
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoQuoteSource {
    async fn fetch_usd(&self) -> Result<f64, SourceError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("ids", self.token_id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(SourceError::Upstream("rate limited (429)".to_string()));
            }
            return Err(SourceError::Upstream(format!("HTTP error: {}", status)));
        }

        let data: CoinGeckoPriceResponse = response.json().await?;
        let price = data
            .get(&self.token_id)
            .and_then(|p| p.usd)
            .ok_or_else(|| SourceError::Upstream(format!("no usd price for {}", self.token_id)))?;

        // Validar precio razonable
        if !price.is_finite() || price <= 0.0 {
            return Err(SourceError::Upstream(format!("invalid price {}", price)));
        }
        Ok(price)
    }
}

/// Single-slot, TTL-bounded cache of the staking token's USD price.
///
/// Readers never block on the network for longer than one refresh, and never see
/// an unset value: the slot starts with a bootstrap quote and a failed refresh
/// leaves the previous quote in place. Concurrent callers may both observe a stale
/// quote and both refresh; the refreshes fetch the same upstream value, so the
/// last store wins harmlessly.
pub struct PriceQuoteCache {
    quote: ArcSwap<PriceQuote>,
    source: Arc<dyn QuoteSource>,
    clock: Arc<dyn Clock>,
}

impl PriceQuoteCache {
    pub fn new(source: Arc<dyn QuoteSource>, default_value_usd: f64, ttl: Duration) -> Self {
        Self::with_clock(source, default_value_usd, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn QuoteSource>,
        default_value_usd: f64,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quote: ArcSwap::from_pointee(PriceQuote::bootstrap(default_value_usd, ttl)),
            source,
            clock,
        }
    }

    pub fn from_settings(source: Arc<dyn QuoteSource>, settings: &PriceSettings) -> Self {
        let ttl = Duration::seconds(settings.ttl_seconds as i64);
        Self::new(source, settings.default_value_usd, ttl)
    }

    /// Current quote without triggering a refresh.
    pub fn snapshot(&self) -> PriceQuote {
        **self.quote.load()
    }

    /// USD value of one token, refreshing first if the quote is stale.
    pub async fn get_usd_value(&self) -> f64 {
        let current = self.quote.load_full();
        let now = self.clock.now();
        if !current.is_stale(now) {
            debug!("PriceQuoteCache: using cached quote {}", current.value_usd);
            return current.value_usd;
        }

        match self.source.fetch_usd().await {
            Ok(value_usd) => {
                metrics::increment_price_refresh("ok");
                let fetched_at = self.clock.now();
                self.quote.store(Arc::new(PriceQuote {
                    value_usd,
                    fetched_at: Some(fetched_at),
                    ttl: current.ttl,
                }));
                info!("PriceQuoteCache: refreshed quote to {} USD", value_usd);
                value_usd
            }
            Err(e) => {
                metrics::increment_price_refresh("error");
                warn!(
                    "PriceQuoteCache: refresh failed, keeping {} USD ({})",
                    current.value_usd, e
                );
                current.value_usd
            }
        }
    }
}
