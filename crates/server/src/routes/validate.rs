//! `$validate` for the supported resource types

use axum::{Json, extract::Path, http::StatusCode, response::IntoResponse};
use serde_json::Value as JsonValue;

use clinical_core::{OperationOutcome, check_conformance};

/// POST /api/fhir/{type}/$validate - Check a resource without storing it
pub async fn validate(
    Path(resource_type): Path<String>,
    Json(body): Json<JsonValue>,
) -> impl IntoResponse {
    let declared = body.get("resourceType").and_then(JsonValue::as_str);
    if let Some(declared) = declared.filter(|d| *d != resource_type) {
        let outcome = OperationOutcome::invalid(&format!(
            "Expected resourceType '{resource_type}', got '{declared}'"
        ));
        return (StatusCode::BAD_REQUEST, Json(outcome));
    }

    match check_conformance(&body) {
        Ok(checked) => (
            StatusCode::OK,
            Json(OperationOutcome::success(&format!("{checked} resource is valid"))),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, Json(e.to_outcome())),
    }
}
