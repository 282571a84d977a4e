//! Metrics for cache and upstream monitoring.

use metrics::{counter, describe_counter};
use tidings_core::UpstreamErrorKind;

/// Metric names.
pub mod names {
    /// Cache lookups answered from a store.
    pub const CACHE_HITS_TOTAL: &str = "tidings_cache_hits_total";
    /// Cache lookups that found nothing.
    pub const CACHE_MISSES_TOTAL: &str = "tidings_cache_misses_total";
    /// Operations redirected to the fallback store.
    pub const CACHE_FALLBACK_TOTAL: &str = "tidings_cache_fallback_total";
    /// Values written to a store.
    pub const CACHE_WRITES_TOTAL: &str = "tidings_cache_writes_total";
    /// Keys removed by invalidation.
    pub const CACHE_INVALIDATED_KEYS_TOTAL: &str = "tidings_cache_invalidated_keys_total";
    /// Upstream calls retried.
    pub const UPSTREAM_RETRIES_TOTAL: &str = "tidings_upstream_retries_total";
    /// Upstream calls that failed after all attempts.
    pub const UPSTREAM_FAILURES_TOTAL: &str = "tidings_upstream_failures_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Cache lookups answered from a store");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Cache lookups that found nothing");
    describe_counter!(
        names::CACHE_FALLBACK_TOTAL,
        "Cache operations redirected to the in-process fallback store"
    );
    describe_counter!(names::CACHE_WRITES_TOTAL, "Values written to a cache store");
    describe_counter!(
        names::CACHE_INVALIDATED_KEYS_TOTAL,
        "Cache keys removed by invalidation"
    );
    describe_counter!(names::UPSTREAM_RETRIES_TOTAL, "Upstream calls retried after a transient failure");
    describe_counter!(
        names::UPSTREAM_FAILURES_TOTAL,
        "Upstream calls that failed after all attempts"
    );
}

pub(crate) fn record_hit(store: &'static str) {
    counter!(names::CACHE_HITS_TOTAL, "store" => store).increment(1);
}

pub(crate) fn record_miss(store: &'static str) {
    counter!(names::CACHE_MISSES_TOTAL, "store" => store).increment(1);
}

pub(crate) fn record_fallback(operation: &'static str) {
    counter!(names::CACHE_FALLBACK_TOTAL, "operation" => operation).increment(1);
}

pub(crate) fn record_write(store: &'static str) {
    counter!(names::CACHE_WRITES_TOTAL, "store" => store).increment(1);
}

pub(crate) fn record_invalidated(count: u64) {
    counter!(names::CACHE_INVALIDATED_KEYS_TOTAL).increment(count);
}

pub(crate) fn record_retry(source: &'static str) {
    counter!(names::UPSTREAM_RETRIES_TOTAL, "source" => source).increment(1);
}

pub(crate) fn record_upstream_failure(source: &'static str, kind: UpstreamErrorKind) {
    counter!(names::UPSTREAM_FAILURES_TOTAL, "source" => source, "kind" => kind.as_str()).increment(1);
}
