//! Metadata endpoint handler

use axum::Json;
use clinical_core::CapabilityStatement;

/// GET /metadata - Resource types this service stores
pub async fn get() -> Json<CapabilityStatement> {
    Json(CapabilityStatement::new())
}
