use chrono::{DateTime, Duration, Utc};
use ethers::types::Address;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One entry of an address' transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEvent {
    pub method: String,
    pub counterparty: Address,
    pub timestamp: DateTime<Utc>,
}

/// A run of continuous holding. `end == None` means still held.
/// `start == None` is the "never held" interval produced for deposit-free histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldingInterval {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl HoldingInterval {
    pub fn open(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn never_held() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_some() && self.end.is_none()
    }

    /// Whole days between start and `end` (or `now` when open), rounded to nearest, never negative.
    pub fn duration_days(&self, now: DateTime<Utc>) -> i64 {
        let Some(start) = self.start else {
            return 0;
        };
        let elapsed = self.end.unwrap_or(now) - start;
        if elapsed <= Duration::zero() {
            return 0;
        }
        (elapsed.num_seconds() as f64 / SECONDS_PER_DAY).round() as i64
    }
}

/// Cached USD quote for the staking token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub value_usd: f64,
    /// `None` until the first successful fetch; the value is then the compiled-in default.
    pub fetched_at: Option<DateTime<Utc>>,
    pub ttl: Duration,
}

impl PriceQuote {
    pub fn bootstrap(value_usd: f64, ttl: Duration) -> Self {
        Self {
            value_usd,
            fetched_at: None,
            ttl,
        }
    }

    /// True on the very first call and once the quote is older than its TTL.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.fetched_at {
            None => true,
            Some(fetched_at) => now - fetched_at > self.ttl,
        }
    }
}
