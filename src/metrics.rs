// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_histogram, histogram};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

// Re-export macros for use in this module when observability is disabled
#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_histogram, histogram};

use std::time::Duration;

/// Initializes the descriptions for all the metrics in the application.
/// This should be called once at startup.
pub fn describe_metrics() {
    describe_counter!(
        "identity_source_outcomes_total",
        "Outcome of each identity source query (named, inferred, no_match, error)."
    );
    describe_histogram!(
        "identity_source_latency_ms",
        "Latency of each identity source query in milliseconds."
    );
    describe_counter!(
        "indexer_pages_fetched_total",
        "Pages successfully fetched from paginated indexers."
    );
    describe_counter!(
        "indexer_retries_total",
        "Retries consumed by paginated indexer traversals."
    );
    describe_counter!(
        "indexer_traversals_total",
        "Completed indexer traversals by termination reason."
    );
    describe_counter!(
        "price_refresh_total",
        "Price quote refresh attempts by result (ok, error)."
    );
    describe_counter!(
        "staking_read_errors_total",
        "Failed staking token reads reported as zero."
    );
}

pub fn increment_source_outcome(source: &str, outcome: &str) {
    counter!("identity_source_outcomes_total", 1,
             "source" => source.to_string(),
             "outcome" => outcome.to_string());
}

pub fn record_source_latency(source: &str, duration: Duration) {
    histogram!("identity_source_latency_ms", duration.as_millis() as f64,
               "source" => source.to_string());
}

pub fn increment_indexer_page(indexer: &str) {
    counter!("indexer_pages_fetched_total", 1, "indexer" => indexer.to_string());
}

pub fn increment_indexer_retry(indexer: &str) {
    counter!("indexer_retries_total", 1, "indexer" => indexer.to_string());
}

pub fn increment_indexer_traversal(indexer: &str, reason: &str) {
    counter!("indexer_traversals_total", 1,
             "indexer" => indexer.to_string(),
             "reason" => reason.to_string());
}

pub fn increment_price_refresh(result: &str) {
    counter!("price_refresh_total", 1, "result" => result.to_string());
}

pub fn increment_staking_read_error(call: &str) {
    counter!("staking_read_errors_total", 1, "call" => call.to_string());
}
