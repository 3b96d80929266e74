//! # Prometheus Metrics — Exposition for Container Orchestration
//!
//! Exposes operational metrics in the Prometheus text exposition format.
//!
//! ## Metrics Exposed
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `researches_http_request_duration_seconds` | Histogram | `method`, `path` | Request latency |
//! | `researches_store_operations_total` | Counter | `operation`, `outcome` | Store calls by result |
//!
//! Paths are normalized before labelling (numeric ids become `:id`) so the
//! label set stays bounded. The `/metrics` endpoint renders the registry on
//! each scrape.

use crate::error::StoreError;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct StoreLabel {
    pub operation: String,
    pub outcome: String,
}

type HistogramConstructor = fn() -> Histogram;

fn http_duration_histogram() -> Histogram {
    // 5ms .. ~10s
    Histogram::new(exponential_buckets(0.005, 2.0, 12))
}

/// Thread-safe metrics registry for the API server.
pub struct Metrics {
    pub registry: Registry,
    pub http_request_duration: Family<HttpLabel, Histogram, HistogramConstructor>,
    pub store_operations: Family<StoreLabel, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_request_duration = Family::<HttpLabel, Histogram, HistogramConstructor>::new_with_constructor(
            http_duration_histogram,
        );
        registry.register(
            "researches_http_request_duration_seconds",
            "HTTP request latency by method and normalized path",
            http_request_duration.clone(),
        );

        let store_operations = Family::<StoreLabel, Counter>::default();
        registry.register(
            "researches_store_operations",
            "Store operations by operation and outcome",
            store_operations.clone(),
        );

        Self {
            registry,
            http_request_duration,
            store_operations,
        }
    }

    /// Count one store call under `operation`, labelled with its outcome.
    pub fn observe_store<T>(&self, operation: &str, result: &Result<T, StoreError>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.store_operations
            .get_or_create(&StoreLabel {
                operation: operation.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        if let Err(e) = encode(&mut buf, &self.registry) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
