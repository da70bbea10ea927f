//! clinical-server library crate
//!
//! Exposes `build_app`, `config`, the infrastructure clients and the use
//! cases so integration tests can wire the service against mock upstreams.
//! The binary entrypoint is in `main.rs`.

pub mod config;
mod error;
pub mod infrastructure;
mod middleware;
mod routes;
pub mod usecases;

use axum::http::HeaderValue;
use axum::{Extension, Router, middleware as axum_mw, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use usecases::ClinicalUseCases;

/// `*` anywhere in the list opens CORS to every origin; entries that are not
/// valid header values are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Installs the Prometheus recorder. When one is already installed (a second
/// app built in the same test binary) the new recorder only serves its own
/// handle, which is then empty.
fn prometheus_handle() -> PrometheusHandle {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if metrics::set_global_recorder(recorder).is_err() {
        tracing::debug!("Metrics recorder already installed");
    }
    handle
}

/// The service router: tenant-scoped clinical routes under `/api`, and the
/// public `/metadata`, `/health` and `/metrics` endpoints.
///
/// Tests build it directly against mocked upstreams without binding a port.
pub fn build_app(usecases: ClinicalUseCases, config: &Config) -> Router {
    let clinical = Router::new()
        .nest("/api", routes::api_routes())
        .layer(axum_mw::from_fn(middleware::tenant_middleware))
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(middleware::create_rate_limiter(config.rate_limit_rps)));

    let public = Router::new()
        .route("/metadata", get(routes::metadata::get))
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle()));

    Router::new()
        .merge(public)
        .merge(clinical)
        .with_state(usecases)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}
