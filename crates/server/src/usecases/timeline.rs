//! Patient health timeline.
//!
//! Allergies, observations and medication statements are fetched
//! concurrently and merged into one list of JSON objects, each carrying its
//! `resourceType` and a `timelineDate` taken from the type's own date field.
//! A family whose query fails is left out and named in
//! `failed_resource_types`; the call only fails when every family does.

use std::cmp::Reverse;

use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use clinical_core::dto::{HealthTimeline, HealthTimelineInput};
use clinical_core::model::{AllergyIntolerance, FhirDateTime, MedicationStatement, Observation};
use clinical_core::{ClinicalError, Resource, Result};

use super::ClinicalUseCases;
use crate::infrastructure::fhir::FhirRepository;
use crate::infrastructure::resources::{self, patient_params};

const TIMELINE_DATE: &str = "timelineDate";

/// Unordered, unpaginated timeline entries
#[derive(Debug, Clone, Default)]
pub struct PatientTimeline {
    pub entries: Vec<Map<String, JsonValue>>,
    pub failed_resource_types: Vec<String>,
}

async fn branch<T: Resource>(
    fhir: &dyn FhirRepository,
    params: &[(String, String)],
    date_field: &str,
) -> Result<Vec<Map<String, JsonValue>>> {
    let found: Vec<T> = resources::search(fhir, params).await?;
    let mut entries = Vec::with_capacity(found.len());
    for resource in &found {
        let JsonValue::Object(mut entry) = resource.to_payload()? else {
            continue;
        };
        let date = entry.get(date_field).cloned().unwrap_or(JsonValue::Null);
        entry.insert(TIMELINE_DATE.to_string(), date);
        entries.push(entry);
    }
    Ok(entries)
}

fn timeline_date(entry: &Map<String, JsonValue>) -> Option<chrono::DateTime<chrono::Utc>> {
    entry
        .get(TIMELINE_DATE)
        .and_then(JsonValue::as_str)
        .and_then(|s| FhirDateTime(s.to_string()).to_utc())
}

impl ClinicalUseCases {
    /// Every timeline entry for the patient, in no particular order.
    pub async fn patient_timeline(&self, patient_id: &str) -> Result<PatientTimeline> {
        if Uuid::parse_str(patient_id).is_err() {
            return Err(ClinicalError::validation(format!("invalid patient id: {patient_id}")));
        }

        let params = patient_params(patient_id);
        let fhir = &*self.infra.fhir;
        let (allergies, observations, medications) = tokio::join!(
            branch::<AllergyIntolerance>(fhir, &params, "recordedDate"),
            branch::<Observation>(fhir, &params, "effectiveInstant"),
            branch::<MedicationStatement>(fhir, &params, "effectiveDateTime"),
        );

        let mut timeline = PatientTimeline::default();
        let mut last_error = None;
        for (resource_type, result) in [
            (AllergyIntolerance::RESOURCE_TYPE, allergies),
            (Observation::RESOURCE_TYPE, observations),
            (MedicationStatement::RESOURCE_TYPE, medications),
        ] {
            match result {
                Ok(entries) => timeline.entries.extend(entries),
                Err(e) => {
                    metrics::counter!("timeline_branch_failures_total", "resource" => resource_type)
                        .increment(1);
                    tracing::error!(
                        target: "error_tracking",
                        resource_type,
                        patient_id,
                        error = %e,
                        "Timeline query failed"
                    );
                    timeline.failed_resource_types.push(resource_type.to_string());
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if timeline.failed_resource_types.len() == 3 => Err(e),
            _ => Ok(timeline),
        }
    }

    /// One page of the patient's timeline, most recent first.
    pub async fn patient_health_timeline(&self, input: HealthTimelineInput) -> Result<HealthTimeline> {
        let PatientTimeline {
            mut entries,
            failed_resource_types,
        } = self.patient_timeline(&input.patient_id).await?;

        // Undated entries sort last.
        entries.sort_by_key(|entry| Reverse(timeline_date(entry)));
        let total_count = entries.len();
        let timeline = entries.into_iter().skip(input.offset).take(input.limit).collect();

        Ok(HealthTimeline {
            timeline,
            total_count,
            failed_resource_types,
        })
    }
}
