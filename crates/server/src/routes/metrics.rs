//! Prometheus scrape endpoint

use axum::{Extension, http::header, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// GET /metrics - HTTP, timeline and event-publishing metrics in text format
pub async fn get(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], handle.render())
}
