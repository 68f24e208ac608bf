//! Metrics definitions for the ledger client.
//!
//! Metrics are collected using the `metrics` crate facade; the embedding
//! application decides on an exporter (Prometheus or otherwise).

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "ledger_ranges_fetched_total",
        "Total number of transaction range reads issued"
    );
    describe_counter!(
        "ledger_records_dropped_total",
        "Total number of raw records dropped as unparseable"
    );
    describe_counter!(
        "ledger_traversals_total",
        "Total number of full-log traversals started"
    );
    describe_histogram!(
        "ledger_range_fetch_duration_seconds",
        "Time taken by one remote range read in seconds"
    );
}

/// Record one issued range read.
///
/// # Arguments
/// * `segment` - The segment served ("live" or "archive")
pub fn record_range_fetched(segment: &str) {
    counter!("ledger_ranges_fetched_total", "segment" => segment.to_string()).increment(1);
}

/// Record raw records dropped during normalization.
pub fn record_records_dropped(count: u64) {
    counter!("ledger_records_dropped_total").increment(count);
}

/// Record a started traversal.
pub fn record_traversal_started() {
    counter!("ledger_traversals_total").increment(1);
}

/// Record one range read's duration.
pub fn record_fetch_duration(duration_secs: f64) {
    histogram!("ledger_range_fetch_duration_seconds").record(duration_secs);
}

/// A timer that records the fetch duration when dropped.
pub struct FetchTimer {
    start: Instant,
}

impl FetchTimer {
    /// Start a new fetch timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for FetchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FetchTimer {
    fn drop(&mut self) {
        record_fetch_duration(self.start.elapsed().as_secs_f64());
    }
}
