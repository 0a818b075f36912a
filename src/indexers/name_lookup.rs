use super::{rate_limiter, DirectRateLimiter};
use crate::error::SourceError;
use crate::name_resolution::NameIndexer;
use crate::types::conversions::{address_to_string, string_to_address};
use crate::types::{IdentitySource, NameMatch};
use async_trait::async_trait;
use ethers::types::Address;
use log::debug;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
struct NameRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameLookupResponse {
    #[serde(default)]
    items: Vec<NameRecord>,
}

/// Direct address -> name lookup against an indexer endpoint.
///
/// The URL template must contain `{address}`, which is replaced by the lowercase
/// `0x` address. The endpoint answers `{ "items": [{ "name": ..., "address": ... }] }`
/// with zero or one matching record.
pub struct DirectNameIndexer {
    client: reqwest::Client,
    url_template: String,
    source: IdentitySource,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl DirectNameIndexer {
    pub fn new(
        client: reqwest::Client,
        url_template: impl Into<String>,
        source: IdentitySource,
        requests_per_second: u32,
    ) -> anyhow::Result<Self> {
        let url_template = url_template.into();
        if !url_template.contains("{address}") {
            anyhow::bail!("name lookup url {:?} has no {{address}} placeholder", url_template);
        }
        Ok(Self {
            client,
            url_template,
            source,
            limiter: rate_limiter(requests_per_second),
        })
    }

    fn url_for(&self, address: Address) -> String {
        self.url_template.replace("{address}", &address_to_string(address))
    }
}

/// First record with a non-empty name whose address (when given) is `address`.
fn pick_name(records: Vec<NameRecord>, address: Address) -> NameMatch {
    let found = records.into_iter().find_map(|record| {
        let matches_address = match record.address.as_deref() {
            Some(raw) => string_to_address(raw).map_or(false, |a| a == address),
            None => true,
        };
        if !matches_address {
            return None;
        }
        match NameMatch::from_name(record.name) {
            NameMatch::Named(name) => Some(name),
            _ => None,
        }
    });
    NameMatch::from_name(found)
}

#[async_trait]
impl NameIndexer for DirectNameIndexer {
    fn source(&self) -> IdentitySource {
        self.source
    }

    async fn lookup(&self, address: Address) -> Result<NameMatch, SourceError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let url = self.url_for(address);
        debug!("name lookup GET {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(NameMatch::NoMatch);
        }
        if !status.is_success() {
            return Err(SourceError::Upstream(format!("name lookup HTTP {}", status)));
        }

        let body: NameLookupResponse = response.json().await?;
        Ok(pick_name(body.items, address))
    }
}
