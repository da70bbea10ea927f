//! Facility registration

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use clinical_core::dto::FacilityInput;

use crate::error::AppError;
use crate::usecases::ClinicalUseCases;

/// POST /api/organizations
pub async fn create(
    State(usecases): State<ClinicalUseCases>,
    Json(input): Json<FacilityInput>,
) -> Result<impl IntoResponse, AppError> {
    let organization = usecases.create_organization(input).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}
