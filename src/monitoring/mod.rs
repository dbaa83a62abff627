//! Monitoring: metric handles and Prometheus exposition
//!
//! Metrics are recorded through the `metrics` facade, so any recorder works.
//! The server installs the Prometheus recorder and renders it on `/metrics`.

pub mod metrics;

pub use self::metrics::InferenceMetrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Price buckets in USD, spanning the range of the training data
const PRICE_BUCKETS: &[f64] = &[
    5_000.0, 7_500.0, 10_000.0, 12_500.0, 15_000.0, 20_000.0, 25_000.0, 30_000.0, 40_000.0,
    50_000.0,
];

const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

/// Install the global Prometheus recorder and return a handle for rendering.
///
/// Can only succeed once per process.
pub fn install_prometheus() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(self::metrics::PREDICTION_PRICE.to_string()),
            PRICE_BUCKETS,
        )
        .context("invalid price buckets")?
        .set_buckets_for_metric(
            Matcher::Full(self::metrics::PREDICTION_DURATION.to_string()),
            DURATION_BUCKETS,
        )
        .context("invalid duration buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
