//! Structural conformance checks against the full FHIR R4B model.
//!
//! The crate's own resource types only carry the fields the service uses.
//! Payloads that arrive from outside are also checked against fhir-sdk's
//! complete definitions before they are written.

use fhir_sdk::r4b::resources as r4b;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{ClinicalError, Result};

/// Resource types the service stores
pub const SUPPORTED_RESOURCE_TYPES: &[&str] = &[
    "Patient",
    "Encounter",
    "Observation",
    "Condition",
    "AllergyIntolerance",
    "MedicationStatement",
    "Organization",
    "EpisodeOfCare",
];

fn check_as<T: DeserializeOwned>(resource_type: &str, payload: &JsonValue) -> Result<()> {
    serde_json::from_value::<T>(payload.clone())
        .map(|_| ())
        .map_err(|e| ClinicalError::validation(format!("{resource_type} does not conform: {e}")))
}

/// Check that `payload` is a well-formed resource of a supported type.
///
/// Returns the resource type on success.
pub fn check_conformance(payload: &JsonValue) -> Result<String> {
    let resource_type = payload
        .get("resourceType")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| ClinicalError::validation("Missing required field: resourceType"))?;

    match resource_type {
        "Patient" => check_as::<r4b::Patient>(resource_type, payload)?,
        "Encounter" => check_as::<r4b::Encounter>(resource_type, payload)?,
        "Observation" => check_as::<r4b::Observation>(resource_type, payload)?,
        "Condition" => check_as::<r4b::Condition>(resource_type, payload)?,
        "AllergyIntolerance" => check_as::<r4b::AllergyIntolerance>(resource_type, payload)?,
        "MedicationStatement" => check_as::<r4b::MedicationStatement>(resource_type, payload)?,
        "Organization" => check_as::<r4b::Organization>(resource_type, payload)?,
        "EpisodeOfCare" => check_as::<r4b::EpisodeOfCare>(resource_type, payload)?,
        other => {
            return Err(ClinicalError::validation(format!(
                "unsupported resourceType '{other}'"
            )));
        }
    }

    Ok(resource_type.to_string())
}
