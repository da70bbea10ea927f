//! Encounter lifecycle handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use clinical_core::dto::{EncounterClassInput, EncounterInput, EncounterStatusInput};

use crate::error::AppError;
use crate::infrastructure::tenant::TenantContext;
use crate::usecases::ClinicalUseCases;

/// POST /api/encounters
pub async fn start(
    State(usecases): State<ClinicalUseCases>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<EncounterInput>,
) -> Result<impl IntoResponse, AppError> {
    let encounter = usecases.start_encounter(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(encounter)))
}

/// POST /api/encounters/{id}/status
pub async fn set_status(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
    Json(input): Json<EncounterStatusInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.transition_encounter(&id, input.status).await?))
}

/// POST /api/encounters/{id}/class
pub async fn set_class(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
    Json(input): Json<EncounterClassInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.reclassify_encounter(&id, input.class).await?))
}

/// POST /api/encounters/{id}/end
pub async fn end(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.end_encounter(&id).await?))
}
