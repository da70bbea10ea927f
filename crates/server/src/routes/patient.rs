//! Patient HTTP handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use clinical_core::dto::{HealthTimelineInput, Pagination, PatientInput, PatientRegistrationInput};

use crate::error::AppError;
use crate::infrastructure::tenant::TenantContext;
use crate::usecases::{ClinicalUseCases, VitalSign};

/// POST /api/patients
pub async fn create(
    State(usecases): State<ClinicalUseCases>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<PatientInput>,
) -> Result<impl IntoResponse, AppError> {
    let patient = usecases.create_patient(&ctx, input).await?;
    let location = format!("/api/patients/{}", patient.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(patient)))
}

/// POST /api/patients/register
pub async fn register(
    State(usecases): State<ClinicalUseCases>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<PatientRegistrationInput>,
) -> Result<impl IntoResponse, AppError> {
    let patient = usecases.register_patient(&ctx, input).await?;
    let location = format!("/api/patients/{}", patient.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(patient)))
}

/// GET /api/patients/{id}
pub async fn read(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.get_patient(&id).await?))
}

/// GET /api/patients/{id}/timeline
pub async fn timeline(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let input = HealthTimelineInput {
        patient_id: id,
        offset: page.offset,
        limit: page.limit,
    };
    Ok(Json(usecases.patient_health_timeline(input).await?))
}

/// GET /api/patients/{id}/encounters
pub async fn encounters(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.list_patient_encounters(&id).await?))
}

/// GET /api/patients/{id}/conditions?offset=&limit=
pub async fn conditions(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.list_patient_conditions(&id, page).await?))
}

/// GET /api/patients/{id}/medical-data
pub async fn medical_data(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.get_medical_data(&id).await?))
}

/// GET /api/patients/{id}/observations/{vital}
pub async fn vital_entries(
    State(usecases): State<ClinicalUseCases>,
    Path((id, vital)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let vital: VitalSign = vital.parse()?;
    Ok(Json(usecases.get_patient_vital_entries(&id, vital).await?))
}
