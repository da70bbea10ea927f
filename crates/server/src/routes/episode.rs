//! Episode of care handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use clinical_core::dto::EpisodeOfCareInput;

use crate::error::AppError;
use crate::infrastructure::tenant::TenantContext;
use crate::usecases::ClinicalUseCases;

/// POST /api/episodes-of-care
pub async fn create(
    State(usecases): State<ClinicalUseCases>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<EpisodeOfCareInput>,
) -> Result<impl IntoResponse, AppError> {
    let episode = usecases.create_episode_of_care(&ctx, input).await?;
    let location = format!("/api/episodes-of-care/{}", episode.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(episode)))
}

/// GET /api/episodes-of-care/{id}
pub async fn read(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.get_episode_of_care(&id).await?))
}

/// POST /api/episodes-of-care/{id}/end
pub async fn end(
    State(usecases): State<ClinicalUseCases>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(usecases.end_episode_of_care(&id).await?))
}
