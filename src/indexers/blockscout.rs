use super::{rate_limiter, DirectRateLimiter};
use crate::error::SourceError;
use crate::holding_period::TransactionLog;
use crate::name_resolution::NameIndexer;
use crate::paginated_indexer::{
    BackoffPolicy, Page, PageSource, PaginatedIndexerClient, PaginationCursor,
};
use crate::types::conversions::string_to_address;
use crate::types::{IdentitySource, NameMatch, TransactionEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::Address;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct AddressParam {
    pub hash: String,
}

/// One item of Blockscout's `/addresses/{addr}/transactions` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexedTransaction {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub to: Option<AddressParam>,
    /// Pending transactions have no timestamp yet.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl IndexedTransaction {
    /// Blockscout reports `"ok"` / `"error"`; a missing status is treated as success.
    pub fn is_successful(&self) -> bool {
        !matches!(self.status.as_deref(), Some("error"))
    }

    pub fn to_address(&self) -> Option<Address> {
        self.to.as_ref().and_then(|to| string_to_address(&to.hash).ok())
    }

    /// Successful, timestamped transactions with a recipient become events.
    pub fn to_event(&self) -> Option<TransactionEvent> {
        if !self.is_successful() {
            return None;
        }
        Some(TransactionEvent {
            method: self.method.clone().unwrap_or_default(),
            counterparty: self.to_address()?,
            timestamp: self.timestamp?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TransactionsPage {
    #[serde(default)]
    items: Vec<IndexedTransaction>,
    #[serde(default)]
    next_page_params: Option<Map<String, Value>>,
}

/// Request for one page: the address plus the query pairs of the previous page's cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockscoutRequest {
    pub address: Address,
    pub params: Vec<(String, String)>,
}

impl BlockscoutRequest {
    pub fn first_page(address: Address) -> Self {
        Self {
            address,
            params: Vec::new(),
        }
    }
}

/// Blockscout v2 transaction listing (newest-first, `next_page_params` cursor).
pub struct BlockscoutTransactions {
    client: reqwest::Client,
    base_url: Url,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl BlockscoutTransactions {
    pub fn new(client: reqwest::Client, base_url: &str, requests_per_second: u32) -> anyhow::Result<Self> {
        // trailing slash so join() appends instead of replacing the last segment
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            limiter: rate_limiter(requests_per_second),
        })
    }

    fn page_url(&self, request: &BlockscoutRequest) -> Result<Url, SourceError> {
        let path = format!("api/v2/addresses/{:?}/transactions", request.address);
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| SourceError::Upstream(format!("invalid indexer url: {}", e)))?;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(request.params.iter());
        }
        Ok(url)
    }
}

/// Cursor payload -> query pairs. Nulls are dropped, strings are passed raw.
fn cursor_params(cursor: &PaginationCursor) -> Vec<(String, String)> {
    let Ok(map) = serde_json::from_str::<Map<String, Value>>(cursor.as_str()) else {
        return Vec::new();
    };
    map.into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

#[async_trait]
impl PageSource for BlockscoutTransactions {
    type Item = IndexedTransaction;
    type Request = BlockscoutRequest;

    fn name(&self) -> &str {
        "blockscout"
    }

    async fn fetch_page(&self, request: &BlockscoutRequest) -> Result<Page<IndexedTransaction>, SourceError> {
        let url = self.page_url(request)?;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!("blockscout GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Upstream(format!("blockscout HTTP {}", status)));
        }

        let body: TransactionsPage = response.json().await?;
        // An all-null `next_page_params` carries no position and marks the last page.
        let next_cursor = match body.next_page_params {
            Some(params) if params.values().any(|v| !v.is_null()) => {
                Some(PaginationCursor(Value::Object(params).to_string()))
            }
            _ => None,
        };
        Ok(Page {
            items: body.items,
            next_cursor,
        })
    }

    fn next_request(&self, current: &BlockscoutRequest, cursor: &PaginationCursor) -> BlockscoutRequest {
        let params = cursor_params(cursor);
        if params.is_empty() {
            warn!("blockscout cursor {:?} carried no usable params", cursor.as_str());
        }
        BlockscoutRequest {
            address: current.address,
            params,
        }
    }
}

/// Registration evidence: any successful transaction sent to a registration contract.
pub struct RegistrationEvidenceIndexer {
    client: Arc<PaginatedIndexerClient<BlockscoutTransactions>>,
    registration_contracts: HashSet<Address>,
    max_retries: u32,
    source: IdentitySource,
}

impl RegistrationEvidenceIndexer {
    pub fn new(
        client: Arc<PaginatedIndexerClient<BlockscoutTransactions>>,
        registration_contracts: impl IntoIterator<Item = Address>,
        max_retries: u32,
    ) -> Self {
        Self {
            client,
            registration_contracts: registration_contracts.into_iter().collect(),
            max_retries,
            source: IdentitySource::IndexerB,
        }
    }

    pub fn with_source(mut self, source: IdentitySource) -> Self {
        self.source = source;
        self
    }

    fn is_evidence(&self, tx: &IndexedTransaction) -> bool {
        tx.is_successful()
            && tx
                .to_address()
                .map_or(false, |to| self.registration_contracts.contains(&to))
    }
}

#[async_trait]
impl NameIndexer for RegistrationEvidenceIndexer {
    fn source(&self) -> IdentitySource {
        self.source
    }

    async fn lookup(&self, address: Address) -> Result<NameMatch, SourceError> {
        if self.registration_contracts.is_empty() {
            return Ok(NameMatch::NoMatch);
        }
        let outcome = self
            .client
            .fetch_until(
                BlockscoutRequest::first_page(address),
                |tx| self.is_evidence(tx),
                self.max_retries,
            )
            .await
            .into_result()?;

        Ok(if outcome.matched {
            NameMatch::Inferred
        } else {
            NameMatch::NoMatch
        })
    }
}

/// Full transaction log of an address, as events.
pub struct TransactionHistory {
    client: Arc<PaginatedIndexerClient<BlockscoutTransactions>>,
    max_retries: u32,
}

impl TransactionHistory {
    pub fn new(client: Arc<PaginatedIndexerClient<BlockscoutTransactions>>, max_retries: u32) -> Self {
        Self { client, max_retries }
    }
}

#[async_trait]
impl TransactionLog for TransactionHistory {
    /// Collects every page. If the retry budget runs out mid-way, the events gathered
    /// so far are returned; a partial log still bounds holding time from below.
    async fn events(&self, address: Address) -> Vec<TransactionEvent> {
        let outcome = self
            .client
            .fetch_until(BlockscoutRequest::first_page(address), |_| false, self.max_retries)
            .await;
        if let Some(e) = &outcome.error {
            warn!(
                "transaction history for {:?} is partial ({} items): {}",
                address,
                outcome.items.len(),
                e
            );
        }
        // Blockscout lists newest-first; replay needs source order oldest-first so the
        // stable sort keeps same-second events in the order they happened.
        outcome
            .items
            .iter()
            .rev()
            .filter_map(IndexedTransaction::to_event)
            .collect()
    }
}

/// Standard wiring: one rate-limited Blockscout client with the configured backoff.
pub fn blockscout_client(
    http: reqwest::Client,
    base_url: &str,
    requests_per_second: u32,
    backoff: BackoffPolicy,
) -> anyhow::Result<Arc<PaginatedIndexerClient<BlockscoutTransactions>>> {
    let source = BlockscoutTransactions::new(http, base_url, requests_per_second)?;
    Ok(Arc::new(PaginatedIndexerClient::new(source).with_backoff(backoff)))
}
