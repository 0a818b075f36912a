//! # Paginated Indexer Client
//!
//! Cursor-following traversal over a remote paged API with a bounded,
//! traversal-wide retry budget.
//!
//! ## Overview
//!
//! Indexers differ in how they page (newest-first vs oldest-first, numeric
//! offsets vs opaque `next_page_params` blobs). The client therefore knows nothing
//! about URLs: each indexer implements [`PageSource`], which both fetches a page
//! and builds the request for the page after a given cursor.
//!
//! The same traversal serves two kinds of callers:
//!
//! - **Match probes** ("has this address ever touched contract X?") pass a predicate
//!   and stop at the first page that satisfies it.
//! - **History collectors** pass an always-false predicate and run to exhaustion.
//!
//! ## Retry budget
//!
//! A failing page is retried in place with exponential backoff. Retries are counted
//! across the whole traversal, not per page: a traversal configured with
//! `max_retries = 3` issues at most three retries in total no matter how many pages
//! it follows.

use crate::error::SourceError;
use crate::metrics;
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Opaque continuation token handed out by an indexer. Absence marks the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor(pub String);

impl PaginationCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of indexer results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<PaginationCursor>,
}

/// A remote paged API.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;
    type Request: Clone + PartialEq + Send + Sync;

    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    async fn fetch_page(&self, request: &Self::Request) -> Result<Page<Self::Item>, SourceError>;

    /// Build the request for the page that follows `cursor`.
    fn next_request(&self, current: &Self::Request, cursor: &PaginationCursor) -> Self::Request;
}

/// Why a traversal stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Found,
    Exhausted,
    RetriesExhausted,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::Found => "found",
            TerminationReason::Exhausted => "exhausted",
            TerminationReason::RetriesExhausted => "retries_exhausted",
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub matched: bool,
    /// Every item of every page fetched, in the order the indexer returned them.
    pub items: Vec<T>,
    pub termination: TerminationReason,
    pub pages_fetched: usize,
    pub retries_used: u32,
    /// Set when the traversal stopped on [`TerminationReason::RetriesExhausted`].
    pub error: Option<SourceError>,
}

impl<T> FetchOutcome<T> {
    /// Collapse into a `Result`, turning an exhausted retry budget into an error.
    /// Items gathered before the failure are dropped.
    pub fn into_result(self) -> Result<Self, SourceError> {
        match self.termination {
            TerminationReason::RetriesExhausted => Err(self.error.unwrap_or_else(|| {
                SourceError::RetriesExhausted {
                    retries: self.retries_used,
                    last: "unknown".to_string(),
                }
            })),
            _ => Ok(self),
        }
    }
}

/// Exponential backoff between retries: `base * 2^(n-1)` capped at `max`, plus up to 10% jitter.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// No waiting between retries.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base.is_zero() {
            return Duration::ZERO;
        }
        let shift = retry.saturating_sub(1).min(16);
        let delay = self.base.saturating_mul(1u32 << shift).min(self.max);
        let jitter_ms = (delay.as_millis() as u64) / 10;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), Duration::from_secs(5))
    }
}

pub struct PaginatedIndexerClient<S> {
    source: S,
    backoff: BackoffPolicy,
}

impl<S: PageSource> PaginatedIndexerClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Follow cursors from `seed` until `matches` accepts an item of a page, the
    /// indexer runs out of pages, or the traversal-wide retry budget is spent.
    pub async fn fetch_until<F>(
        &self,
        seed: S::Request,
        mut matches: F,
        max_retries: u32,
    ) -> FetchOutcome<S::Item>
    where
        F: FnMut(&S::Item) -> bool + Send,
    {
        let name = self.source.name();
        let mut request = seed;
        let mut items = Vec::new();
        let mut pages_fetched = 0usize;
        let mut retries_used = 0u32;
        let mut seen_cursors: HashSet<String> = HashSet::new();

        loop {
            match self.source.fetch_page(&request).await {
                Ok(page) => {
                    pages_fetched += 1;
                    metrics::increment_indexer_page(name);

                    let matched = page.items.iter().any(&mut matches);
                    items.extend(page.items);

                    let termination = if matched {
                        TerminationReason::Found
                    } else if let Some(cursor) = page.next_cursor {
                        let next = self.source.next_request(&request, &cursor);
                        if next != request && seen_cursors.insert(cursor.0.clone()) {
                            request = next;
                            continue;
                        }
                        // A cursor that leads back to an already fetched page ends the walk.
                        warn!(
                            indexer = name,
                            pages = pages_fetched,
                            cursor = cursor.as_str(),
                            "indexer cursor does not advance, stopping traversal"
                        );
                        TerminationReason::Exhausted
                    } else {
                        TerminationReason::Exhausted
                    };

                    debug!(
                        indexer = name,
                        pages = pages_fetched,
                        items = items.len(),
                        retries = retries_used,
                        reason = termination.as_str(),
                        "indexer traversal finished"
                    );
                    metrics::increment_indexer_traversal(name, termination.as_str());
                    return FetchOutcome {
                        matched,
                        items,
                        termination,
                        pages_fetched,
                        retries_used,
                        error: None,
                    };
                }
                Err(e) => {
                    if retries_used >= max_retries {
                        warn!(
                            indexer = name,
                            pages = pages_fetched,
                            retries = retries_used,
                            error = %e,
                            "indexer retry budget exhausted"
                        );
                        metrics::increment_indexer_traversal(
                            name,
                            TerminationReason::RetriesExhausted.as_str(),
                        );
                        return FetchOutcome {
                            matched: false,
                            items,
                            termination: TerminationReason::RetriesExhausted,
                            pages_fetched,
                            retries_used,
                            error: Some(SourceError::RetriesExhausted {
                                retries: retries_used,
                                last: e.to_string(),
                            }),
                        };
                    }

                    retries_used += 1;
                    metrics::increment_indexer_retry(name);
                    let delay = self.backoff.delay_for(retries_used);
                    warn!(
                        indexer = name,
                        attempt = retries_used,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "indexer page fetch failed, retrying same page"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
