//! Request counters and latency histograms for `/metrics`.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

const REQUESTS: &str = "http_requests_total";
const LATENCY: &str = "http_request_duration_seconds";

/// Label value for a request path. Resource ids are replaced by `:id` so the
/// label set stays bounded; the store hands out both UUIDs and numeric ids.
fn path_label(path: &str) -> String {
    let mut label = String::with_capacity(path.len());
    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            label.push('/');
        }
        let is_id = (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
            || uuid::Uuid::try_parse(segment).is_ok();
        label.push_str(if is_id { ":id" } else { segment });
    }
    label
}

pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let path = path_label(request.uri().path());
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::histogram!(LATENCY, "method" => method.clone(), "path" => path.clone())
        .record(started.elapsed().as_secs_f64());
    metrics::counter!(
        REQUESTS,
        "method" => method,
        "path" => path,
        "status" => response.status().as_str().to_owned()
    )
    .increment(1);

    response
}
