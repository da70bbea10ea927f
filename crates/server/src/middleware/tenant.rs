//! Tenant header extraction
//!
//! Every `/api` request must name the organisation it acts for. Program and
//! facility are optional, and the caller's `Authorization` header is kept so
//! it can be forwarded to MyCareHub.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::infrastructure::tenant::TenantContext;

pub const ORGANIZATION_HEADER: &str = "OrganizationID";
pub const PROGRAM_HEADER: &str = "ProgramID";
pub const FACILITY_HEADER: &str = "FacilityID";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn tenant_context(headers: &HeaderMap) -> Result<TenantContext, AppError> {
    let organization_id = header(headers, ORGANIZATION_HEADER).ok_or_else(|| {
        AppError::MissingHeader(format!(
            "expected `{ORGANIZATION_HEADER}` header to be included in the request"
        ))
    })?;

    Ok(TenantContext {
        organization_id,
        program_id: header(headers, PROGRAM_HEADER),
        facility_id: header(headers, FACILITY_HEADER),
        authorization: header(headers, "Authorization"),
    })
}

pub async fn tenant_middleware(mut request: Request, next: Next) -> Response {
    match tenant_context(request.headers()) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
