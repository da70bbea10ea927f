//! Observation, condition and allergy handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use serde::Deserialize;

use clinical_core::dto::{AllergyInput, ConditionInput, ObservationInput};

use crate::error::AppError;
use crate::infrastructure::tenant::TenantContext;
use crate::usecases::{ClinicalUseCases, VitalSign};

/// POST /api/observations/{vital}
pub async fn record_vital(
    State(usecases): State<ClinicalUseCases>,
    Extension(ctx): Extension<TenantContext>,
    Path(vital): Path<String>,
    Json(input): Json<ObservationInput>,
) -> Result<impl IntoResponse, AppError> {
    let vital: VitalSign = vital.parse()?;
    let observation = usecases.record_vital_sign(&ctx, vital, input).await?;
    Ok((StatusCode::CREATED, Json(observation)))
}

/// POST /api/conditions
pub async fn create_condition(
    State(usecases): State<ClinicalUseCases>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<ConditionInput>,
) -> Result<impl IntoResponse, AppError> {
    let condition = usecases.create_condition(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(condition)))
}

/// POST /api/allergies
pub async fn create_allergy(
    State(usecases): State<ClinicalUseCases>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<AllergyInput>,
) -> Result<impl IntoResponse, AppError> {
    let allergy = usecases.create_allergy_intolerance(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(allergy)))
}

#[derive(Debug, Deserialize)]
pub struct AllergySearchParams {
    #[serde(default)]
    pub name: String,
}

/// GET /api/allergies/search?name=
pub async fn search_allergy(
    State(usecases): State<ClinicalUseCases>,
    Query(params): Query<AllergySearchParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.search_allergy(&params.name).await?))
}

/// GET /api/allergies/{id}
pub async fn read_allergy(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.get_allergy_intolerance(&id).await?))
}
