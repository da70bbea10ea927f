//! Audit trail of clinical writes, emitted on the `audit` tracing target.

use axum::{extract::Request, middleware::Next, response::Response};

use super::request_id::RequestId;
use super::tenant::ORGANIZATION_HEADER;

pub async fn audit_middleware(request: Request, next: Next) -> Response {
    if request.method().is_safe() {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request.extensions().get::<RequestId>().map(|id| id.0.clone());
    let organization_id = request
        .headers()
        .get(ORGANIZATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let response = next.run(request).await;

    tracing::info!(
        target: "audit",
        request_id = request_id.as_deref().unwrap_or("unknown"),
        organization_id = organization_id.as_deref().unwrap_or("-"),
        %method,
        path,
        status = response.status().as_u16(),
        "Clinical write"
    );
    response
}
