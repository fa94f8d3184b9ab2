//! Metrics for the notice pipeline
//!
//! Recording goes through the `metrics` facade; nothing is exported unless a
//! recorder is installed with [`init`].

use std::fmt;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Every metric the pipeline records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    NoticesNormalized,
    NoticesFailed,
    NoticesStored,
    SkyMapFetchBytes,
    SkyMapFetchDuration,
    ContourVertices,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NoticesNormalized => "afiss_notices_normalized_total",
            MetricName::NoticesFailed => "afiss_notices_failed_total",
            MetricName::NoticesStored => "afiss_notices_stored_total",
            MetricName::SkyMapFetchBytes => "afiss_sky_map_fetch_bytes",
            MetricName::SkyMapFetchDuration => "afiss_sky_map_fetch_duration_seconds",
            MetricName::ContourVertices => "afiss_contour_vertices",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            NoticesNormalized,
            NoticesFailed,
            NoticesStored,
            SkyMapFetchBytes,
            SkyMapFetchDuration,
            ContourVertices,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install the Prometheus recorder; the handle renders the text exposition
pub fn init() -> Result<PrometheusHandle, String> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    info!("Metrics recorder installed");
    Ok(handle)
}

pub mod notices {
    use super::MetricName;

    pub fn normalized(network: &str) {
        ::metrics::counter!(MetricName::NoticesNormalized.as_str(), "network" => network.to_string())
            .increment(1);
    }

    pub fn failed(error_kind: &'static str) {
        ::metrics::counter!(MetricName::NoticesFailed.as_str(), "error" => error_kind).increment(1);
    }

    pub fn stored() {
        ::metrics::counter!(MetricName::NoticesStored.as_str()).increment(1);
    }
}

pub mod sky_map {
    use super::MetricName;

    /// Record a completed download
    pub fn fetched(bytes: u64, secs: f64) {
        ::metrics::histogram!(MetricName::SkyMapFetchBytes.as_str()).record(bytes as f64);
        ::metrics::histogram!(MetricName::SkyMapFetchDuration.as_str()).record(secs);
    }

    pub fn contour_vertices(count: usize) {
        ::metrics::histogram!(MetricName::ContourVertices.as_str()).record(count as f64);
    }
}
