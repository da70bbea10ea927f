pub mod health;
pub mod metadata;
pub mod metrics;

mod clinical;
mod encounter;
mod episode;
mod organization;
mod patient;
mod validate;

use axum::{Router, routing::{get, post}};

use crate::usecases::ClinicalUseCases;

/// Tenant-scoped clinical routes, mounted under `/api`
pub fn api_routes() -> Router<ClinicalUseCases> {
    Router::new()
        .route("/patients", post(patient::create))
        .route("/patients/register", post(patient::register))
        .route("/patients/{id}", get(patient::read))
        .route("/patients/{id}/timeline", get(patient::timeline))
        .route("/patients/{id}/encounters", get(patient::encounters))
        .route("/patients/{id}/conditions", get(patient::conditions))
        .route("/patients/{id}/medical-data", get(patient::medical_data))
        .route("/patients/{id}/observations/{vital}", get(patient::vital_entries))
        .route("/encounters", post(encounter::start))
        .route("/encounters/{id}/status", post(encounter::set_status))
        .route("/encounters/{id}/class", post(encounter::set_class))
        .route("/encounters/{id}/end", post(encounter::end))
        .route("/episodes-of-care", post(episode::create))
        .route("/episodes-of-care/{id}", get(episode::read))
        .route("/episodes-of-care/{id}/end", post(episode::end))
        .route("/observations/{vital}", post(clinical::record_vital))
        .route("/conditions", post(clinical::create_condition))
        .route("/allergies", post(clinical::create_allergy))
        .route("/allergies/search", get(clinical::search_allergy))
        .route("/allergies/{id}", get(clinical::read_allergy))
        .route("/organizations", post(organization::create))
        .route("/fhir/{type}/$validate", post(validate::validate))
}
