//! Prometheus metrics for the question cache and the push channel.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Metric names.
pub mod names {
    /// Cache lookups that found an entry.
    pub const CACHE_HITS_TOTAL: &str = "qanda_cache_hits_total";
    /// Cache lookups that missed.
    pub const CACHE_MISSES_TOTAL: &str = "qanda_cache_misses_total";
    /// Entries evicted to respect the capacity bound.
    pub const CACHE_EVICTIONS_TOTAL: &str = "qanda_cache_evictions_total";
    /// Read-miss fills discarded because a write invalidated the entry meanwhile.
    pub const CACHE_STALE_FILLS_TOTAL: &str = "qanda_cache_stale_fills_total";
    /// Explicit invalidations.
    pub const CACHE_INVALIDATIONS_TOTAL: &str = "qanda_cache_invalidations_total";

    /// Open push connections.
    pub const WS_CONNECTIONS: &str = "qanda_ws_connections";
    /// Pushes queued to a connection.
    pub const PUSH_DELIVERED_TOTAL: &str = "qanda_push_delivered_total";
    /// Pushes dropped for a connection.
    pub const PUSH_DROPPED_TOTAL: &str = "qanda_push_dropped_total";

    /// Notifications dropped before reaching a dispatch worker.
    pub const DISPATCH_REJECTED_TOTAL: &str = "qanda_dispatch_rejected_total";
    /// Notifications whose re-fetch failed.
    pub const DISPATCH_ERRORS_TOTAL: &str = "qanda_dispatch_errors_total";
    /// Time from re-fetch start to fan-out completion.
    pub const DISPATCH_DURATION_SECONDS: &str = "qanda_dispatch_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Question cache hits");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Question cache misses");
    describe_counter!(
        names::CACHE_EVICTIONS_TOTAL,
        "Question cache entries evicted at capacity"
    );
    describe_counter!(
        names::CACHE_STALE_FILLS_TOTAL,
        "Read-miss fills discarded after a concurrent invalidation"
    );
    describe_counter!(
        names::CACHE_INVALIDATIONS_TOTAL,
        "Question cache entries removed by writes"
    );
    describe_gauge!(names::WS_CONNECTIONS, "Open push connections");
    describe_counter!(names::PUSH_DELIVERED_TOTAL, "Pushes queued to connections");
    describe_counter!(names::PUSH_DROPPED_TOTAL, "Pushes dropped per connection");
    describe_counter!(
        names::DISPATCH_REJECTED_TOTAL,
        "Update notifications dropped because the dispatch queue was full or closed"
    );
    describe_counter!(
        names::DISPATCH_ERRORS_TOTAL,
        "Update notifications whose question could not be loaded"
    );
    describe_histogram!(
        names::DISPATCH_DURATION_SECONDS,
        "Time spent loading and fanning out one update notification"
    );
}

/// Cache metrics recorder.
#[derive(Clone, Copy)]
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a hit.
    pub fn hit() {
        counter!(names::CACHE_HITS_TOTAL).increment(1);
    }

    /// Record a miss.
    pub fn miss() {
        counter!(names::CACHE_MISSES_TOTAL).increment(1);
    }

    /// Record an eviction.
    pub fn eviction() {
        counter!(names::CACHE_EVICTIONS_TOTAL).increment(1);
    }

    /// Record a discarded fill.
    pub fn stale_fill() {
        counter!(names::CACHE_STALE_FILLS_TOTAL).increment(1);
    }

    /// Record an invalidation.
    pub fn invalidation() {
        counter!(names::CACHE_INVALIDATIONS_TOTAL).increment(1);
    }
}

/// Push channel metrics recorder.
#[derive(Clone, Copy)]
pub struct PushMetrics;

impl PushMetrics {
    /// Update the open connection gauge.
    pub fn connections(count: usize) {
        #[allow(clippy::cast_precision_loss)]
        gauge!(names::WS_CONNECTIONS).set(count as f64);
    }

    /// Record queued pushes.
    pub fn delivered(event: &str, count: usize) {
        counter!(names::PUSH_DELIVERED_TOTAL, "event" => event.to_string()).increment(count as u64);
    }

    /// Record dropped pushes.
    pub fn dropped(event: &str, reason: &'static str, count: usize) {
        counter!(
            names::PUSH_DROPPED_TOTAL,
            "event" => event.to_string(),
            "reason" => reason
        )
        .increment(count as u64);
    }

    /// Record a notification that never reached a worker.
    pub fn rejected(reason: &'static str) {
        counter!(names::DISPATCH_REJECTED_TOTAL, "reason" => reason).increment(1);
    }

    /// Record a failed re-fetch.
    pub fn dispatch_error() {
        counter!(names::DISPATCH_ERRORS_TOTAL).increment(1);
    }

    /// Record dispatch duration.
    pub fn dispatch_duration(duration: Duration) {
        histogram!(names::DISPATCH_DURATION_SECONDS).record(duration.as_secs_f64());
    }
}
