//! Typed access to the FHIR store.
//!
//! Thin generic wrappers that turn [`FhirRepository`] JSON into the resource
//! model and back. A stored resource that does not decode is the store's
//! fault, so it surfaces as an upstream error rather than a validation one.

use serde_json::Value as JsonValue;

use clinical_core::{ClinicalError, Resource, Result};

use super::fhir::FhirRepository;

fn decode<T: Resource>(payload: JsonValue) -> Result<T> {
    T::from_payload(payload).map_err(|e| {
        ClinicalError::upstream("fhir", format!("undecodable {}", T::RESOURCE_TYPE), e)
    })
}

pub async fn get<T: Resource>(repo: &dyn FhirRepository, id: &str) -> Result<T> {
    let payload = repo.get_resource(T::RESOURCE_TYPE, id).await?;
    decode(payload)
}

pub async fn create<T: Resource>(repo: &dyn FhirRepository, resource: &T) -> Result<T> {
    let payload = resource.to_payload()?;
    let created = repo.create_resource(T::RESOURCE_TYPE, payload).await?;
    decode(created)
}

/// Replace the stored resource with `resource`, keyed on its id.
pub async fn update<T: Resource>(repo: &dyn FhirRepository, resource: &T) -> Result<T> {
    let id = resource.id().ok_or_else(|| {
        ClinicalError::Internal(format!("cannot update a {} without an id", T::RESOURCE_TYPE))
    })?;
    let payload = resource.to_payload()?;
    let updated = repo.update_resource(T::RESOURCE_TYPE, id, payload).await?;
    decode(updated)
}

/// Matching resources. One undecodable entry fails the whole search, so
/// callers never see a silently shortened list.
pub async fn search<T: Resource>(
    repo: &dyn FhirRepository,
    params: &[(String, String)],
) -> Result<Vec<T>> {
    repo.search(T::RESOURCE_TYPE, params)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

/// Search parameters for resources about one patient
pub fn patient_params(patient_id: &str) -> Vec<(String, String)> {
    vec![("patient".to_string(), format!("Patient/{patient_id}"))]
}
