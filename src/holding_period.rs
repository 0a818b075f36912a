//! # Holding Period Reconstruction
//!
//! Replays an address' transaction log against the staking contract into a
//! sequence of [`HoldingInterval`]s.
//!
//! Per address the replay is a two-state machine:
//!
//! ```text
//!            deposit / delegate
//!   Idle  ───────────────────────▶  Holding(start)
//!    ▲                                  │
//!    └──────── withdraw / transfer ─────┘   (closes [start, t])
//! ```
//!
//! A deposit while already `Holding` keeps the original start. This is a lower
//! bound on holding time, not a ledger reconciliation: partial withdrawals and
//! balance amounts are not tracked.

use crate::types::{HoldingInterval, TransactionEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::Address;
use log::debug;

/// Where an address' transaction log comes from. Implementations degrade to a
/// partial (or empty) log instead of failing.
///
/// Events come oldest-first; [`reconstruct`] relies on that order to break
/// timestamp ties.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn events(&self, address: Address) -> Vec<TransactionEvent>;
}

/// How an event affects the holding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Deposit,
    Exit,
    Other,
}

impl EventKind {
    /// Classify a contract method name (case-insensitive prefix match).
    pub fn classify(method: &str) -> Self {
        let method = method.trim().to_ascii_lowercase();
        if method.starts_with("deposit") || method.starts_with("delegate") {
            EventKind::Deposit
        } else if method.starts_with("withdraw") || method.starts_with("transfer") {
            EventKind::Exit
        } else {
            EventKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldingState {
    Idle,
    Holding(DateTime<Utc>),
}

/// Replay `events` (in any order) into holding intervals.
///
/// Only events whose counterparty is `staking_contract` are considered. A history
/// without any deposit yields a single [`HoldingInterval::never_held`].
pub fn reconstruct(events: &[TransactionEvent], staking_contract: Address) -> Vec<HoldingInterval> {
    let mut relevant: Vec<&TransactionEvent> = events
        .iter()
        .filter(|e| e.counterparty == staking_contract)
        .collect();
    // Stable sort keeps the source order for same-second events.
    relevant.sort_by_key(|e| e.timestamp);

    let mut state = HoldingState::Idle;
    let mut intervals = Vec::new();

    for event in relevant {
        state = match (state, EventKind::classify(&event.method)) {
            (HoldingState::Idle, EventKind::Deposit) => HoldingState::Holding(event.timestamp),
            (HoldingState::Holding(start), EventKind::Exit) => {
                intervals.push(HoldingInterval::closed(start, event.timestamp));
                HoldingState::Idle
            }
            (current, _) => current,
        };
    }

    if let HoldingState::Holding(start) = state {
        intervals.push(HoldingInterval::open(start));
    }

    if intervals.is_empty() {
        debug!("no deposit into {:?} found in {} events", staking_contract, events.len());
        intervals.push(HoldingInterval::never_held());
    }
    intervals
}

/// Longest interval in whole days as of `now`; 0 for an empty slice.
pub fn max_holding_days(intervals: &[HoldingInterval], now: DateTime<Utc>) -> i64 {
    intervals
        .iter()
        .map(|interval| interval.duration_days(now))
        .max()
        .unwrap_or(0)
}
