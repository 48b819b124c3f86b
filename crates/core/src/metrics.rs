//! Metrics definitions for the catalog backend.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "queries_executed_total",
        "Total number of read queries executed against the store"
    );
    describe_histogram!(
        "query_duration_seconds",
        "Time taken by a read query in seconds"
    );
    describe_counter!(
        "entity_writes_total",
        "Total number of successful entity writes"
    );
    describe_counter!(
        "domain_errors_total",
        "Total number of errors returned by the services"
    );
}

/// Record an executed read query.
///
/// # Arguments
/// * `entity` - The entity name ("category", "course", ...)
/// * `kind` - The query kind ("paged", "count", "by_id", ...)
pub fn record_query(entity: &str, kind: &str) {
    counter!("queries_executed_total", "entity" => entity.to_string(), "kind" => kind.to_string())
        .increment(1);
}

/// Record a successful write.
///
/// # Arguments
/// * `entity` - The entity name
/// * `op` - The write operation ("add", "update", "delete")
pub fn record_write(entity: &str, op: &str) {
    counter!("entity_writes_total", "entity" => entity.to_string(), "op" => op.to_string())
        .increment(1);
}

/// Record an error surfaced by a service.
pub fn record_domain_error(kind: &str) {
    counter!("domain_errors_total", "kind" => kind.to_string()).increment(1);
}

/// Record query duration.
pub fn record_query_duration(entity: &str, duration_secs: f64) {
    histogram!("query_duration_seconds", "entity" => entity.to_string()).record(duration_secs);
}

/// A timer that records the query duration when dropped.
pub struct QueryTimer {
    entity: &'static str,
    start: Instant,
}

impl QueryTimer {
    /// Start a new timer for a query on `entity`.
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            start: Instant::now(),
        }
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(self.entity, duration);
    }
}
