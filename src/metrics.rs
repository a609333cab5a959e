//! Prometheus metrics for relay traffic and upstream latency.
//!
//! Without an installed recorder every call here is a no-op, so handlers
//! and tests can record freely.

use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;
use tracing::debug;

// === Metric Name Constants ===

/// Upstream round-trip latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_latency_ms";
/// Inbound relay requests counter metric name.
pub const METRIC_RELAY_REQUESTS: &str = "relay_requests_total";
/// Upstream failures counter metric name.
pub const METRIC_UPSTREAM_FAILURES: &str = "upstream_failures_total";
/// Summary requests answered without an upstream call.
pub const METRIC_SUMMARY_SHORT_CIRCUITS: &str = "summary_short_circuits_total";

// === Route Labels ===

/// Label for the catalog details relay.
pub const ROUTE_CATALOG_DETAILS: &str = "catalog_details";
/// Label for the item details summary filter.
pub const ROUTE_ITEM_DETAILS: &str = "item_details";

/// How often histogram buckets are drained when nobody scrapes `/metrics`.
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Install the global Prometheus recorder and register metric descriptions.
/// Call this once at startup, then [`spawn_upkeep`] on the returned handle.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    Ok(handle)
}

fn describe() {
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream request latency in milliseconds"
    );
    describe_counter!(
        METRIC_RELAY_REQUESTS,
        "Total number of inbound relay requests"
    );
    describe_counter!(
        METRIC_UPSTREAM_FAILURES,
        "Total number of failed upstream calls"
    );
    describe_counter!(
        METRIC_SUMMARY_SHORT_CIRCUITS,
        "Summary requests answered without contacting the upstream"
    );

    debug!("Metrics initialized");
}

/// Run recorder upkeep on an interval.
///
/// `install_recorder` does not schedule upkeep itself; without it histogram
/// samples accumulate until the next render.
pub fn spawn_upkeep(handle: PrometheusHandle, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    })
}

/// Record upstream latency for a route.
pub fn record_upstream_latency(route: &'static str, start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_UPSTREAM_LATENCY, "route" => route).record(latency_ms);
}

/// Increment inbound requests counter.
pub fn inc_relay_requests(route: &'static str) {
    counter!(METRIC_RELAY_REQUESTS, "route" => route).increment(1);
}

/// Increment upstream failures counter.
pub fn inc_upstream_failures(route: &'static str) {
    counter!(METRIC_UPSTREAM_FAILURES, "route" => route).increment(1);
}

/// Increment summary short-circuit counter.
pub fn inc_summary_short_circuits() {
    counter!(METRIC_SUMMARY_SHORT_CIRCUITS).increment(1);
}
