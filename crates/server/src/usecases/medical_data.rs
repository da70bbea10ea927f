//! Clinical summary of a patient: the latest few entries of the current
//! regimen, allergies and the monitored observations.

use std::cmp::Reverse;

use clinical_core::dto::MedicalData;
use clinical_core::model::{AllergyIntolerance, FhirDateTime, MedicationStatement, Observation};
use clinical_core::Result;

use super::ClinicalUseCases;
use super::observation::VitalSign;
use crate::infrastructure::fhir::FhirRepository;
use crate::infrastructure::resources::{self, patient_params};

/// Entries kept per section
pub const MEDICAL_DATA_COUNT: usize = 3;

const VIRAL_LOAD_CONCEPT: &str = "856";
const CD4_COUNT_CONCEPT: &str = "5497";

fn latest<T>(mut found: Vec<T>, date: impl Fn(&T) -> Option<&FhirDateTime>) -> Vec<T> {
    found.sort_by_key(|r| Reverse(date(r).and_then(FhirDateTime::to_utc)));
    found.truncate(MEDICAL_DATA_COUNT);
    found
}

async fn observations(
    fhir: &dyn FhirRepository,
    patient_id: &str,
    concept_id: &str,
) -> Result<Vec<Observation>> {
    let mut params = patient_params(patient_id);
    params.push(("code".to_string(), concept_id.to_string()));
    params.push(("_sort".to_string(), "-date".to_string()));
    let found: Vec<Observation> = resources::search(fhir, &params).await?;
    Ok(latest(found, Observation::effective_at))
}

impl ClinicalUseCases {
    /// Every section is queried concurrently; any failed query fails the call.
    pub async fn get_medical_data(&self, patient_id: &str) -> Result<MedicalData> {
        let fhir = &*self.infra.fhir;
        let mut params = patient_params(patient_id);
        params.push(("_sort".to_string(), "-date".to_string()));

        let result = tokio::try_join!(
            resources::search::<MedicationStatement>(fhir, &params),
            resources::search::<AllergyIntolerance>(fhir, &params),
            observations(fhir, patient_id, VitalSign::Weight.concept_id()),
            observations(fhir, patient_id, VitalSign::Bmi.concept_id()),
            observations(fhir, patient_id, VIRAL_LOAD_CONCEPT),
            observations(fhir, patient_id, CD4_COUNT_CONCEPT),
        );
        let (regimen, allergies, weight, bmi, viral_load, cd4_count) = match result {
            Ok(sections) => sections,
            Err(e) => {
                tracing::error!(target: "error_tracking", patient_id, error = %e, "Medical data query failed");
                return Err(e);
            }
        };

        Ok(MedicalData {
            regimen: latest(regimen, MedicationStatement::effective_at),
            allergies: latest(allergies, |a| a.recorded_date.as_ref()),
            weight,
            bmi,
            viral_load,
            cd4_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fakes::Fakes;
    use super::*;
    use serde_json::json;

    fn observation(fakes: &Fakes, id: &str, code: &str, at: &str) {
        fakes.fhir.insert(json!({
            "resourceType": "Observation",
            "id": id,
            "status": "final",
            "code": {"coding": [{"system": "/orgs/CIEL/sources/CIEL/concepts", "code": code}]},
            "subject": {"reference": "Patient/p1"},
            "effectiveInstant": at
        }));
    }

    fn ids(found: &[Observation]) -> Vec<&str> {
        found.iter().filter_map(|o| o.id.as_deref()).collect()
    }

    #[tokio::test]
    async fn test_latest_three_per_section() {
        let fakes = Fakes::new();
        for (i, month) in ["01", "02", "03", "04", "05"].iter().enumerate() {
            observation(&fakes, &format!("w{i}"), "5089", &format!("2024-{month}-01T08:00:00Z"));
        }
        observation(&fakes, "vl", VIRAL_LOAD_CONCEPT, "2024-02-01T08:00:00Z");
        observation(&fakes, "other", "5088", "2024-02-01T08:00:00Z");
        fakes.fhir.insert(json!({
            "resourceType": "AllergyIntolerance",
            "id": "a1",
            "patient": {"reference": "Patient/p1"},
            "recordedDate": "2024-03-01T10:00:00Z"
        }));
        fakes.fhir.insert(json!({
            "resourceType": "MedicationStatement",
            "id": "m1",
            "status": "active",
            "medicationCodeableConcept": {"text": "TDF/3TC/DTG"},
            "subject": {"reference": "Patient/p1"},
            "effectiveDateTime": "2024-01-15"
        }));

        let data = fakes.usecases().get_medical_data("p1").await.unwrap();

        assert_eq!(ids(&data.weight), vec!["w4", "w3", "w2"]);
        assert_eq!(ids(&data.viral_load), vec!["vl"]);
        assert!(data.bmi.is_empty());
        assert!(data.cd4_count.is_empty());
        assert_eq!(data.allergies.len(), 1);
        assert_eq!(data.regimen[0].id.as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn test_failed_section_fails_the_call() {
        let fakes = Fakes::new();
        observation(&fakes, "w1", "5089", "2024-01-01T08:00:00Z");
        fakes.fhir.fail_search("AllergyIntolerance");

        let err = fakes.usecases().get_medical_data("p1").await.unwrap_err();
        assert!(matches!(err, clinical_core::ClinicalError::Upstream { .. }));
    }
}
