use serde::{Deserialize, Serialize};

use super::choice::{Abatement, Onset};
use super::datatypes::{Annotation, CodeableConcept, Identifier, Meta, Reference};
use super::primitives::FhirDateTime;

/// A clinical condition, problem or diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_site: Vec<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(flatten, deserialize_with = "crate::model::choice::optional")]
    pub onset: Option<Onset>,
    #[serde(flatten, deserialize_with = "crate::model::choice::optional")]
    pub abatement: Option<Abatement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<FhirDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorder: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asserter: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

super::impl_resource!(Condition, "Condition");

impl Condition {
    pub fn new(subject: Reference) -> Self {
        Self {
            id: None,
            meta: None,
            identifier: Vec::new(),
            clinical_status: None,
            verification_status: None,
            category: Vec::new(),
            severity: None,
            code: None,
            body_site: Vec::new(),
            subject,
            encounter: None,
            onset: None,
            abatement: None,
            recorded_date: None,
            recorder: None,
            asserter: None,
            note: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationAuthor, Resource};

    #[test]
    fn test_condition_round_trip_with_onset_and_abatement() {
        let json = serde_json::json!({
            "resourceType": "Condition",
            "id": "c1",
            "clinicalStatus": {"coding": [{"system": "http://terminology.hl7.org/CodeSystem/condition-clinical", "code": "active"}]},
            "category": [{"coding": [{"system": "http://terminology.hl7.org/CodeSystem/condition-category", "code": "problem-list-item"}]}],
            "code": {"coding": [{"system": "/orgs/CIEL/sources/CIEL/concepts", "code": "117399"}], "text": "Hypertension"},
            "subject": {"reference": "Patient/p1"},
            "onsetAge": {"value": 52.0, "unit": "a"},
            "abatementString": "after lifestyle change",
            "recordedDate": "2024-02-03T10:00:00Z",
            "note": [{"authorString": "Dr. Otieno", "text": "monitor monthly"}]
        });

        let condition = Condition::from_payload(json.clone()).unwrap();
        assert!(matches!(condition.onset, Some(Onset::Age(_))));
        assert!(matches!(condition.abatement, Some(Abatement::String(_))));
        assert_eq!(
            condition.note[0].author,
            Some(AnnotationAuthor::String("Dr. Otieno".into()))
        );
        assert_eq!(condition.to_payload().unwrap(), json);
    }

    #[test]
    fn test_subject_is_required() {
        let json = serde_json::json!({"resourceType": "Condition", "id": "c1"});
        assert!(Condition::from_payload(json).is_err());
    }

    #[test]
    fn test_bad_onset_age_comparator_is_rejected() {
        let json = serde_json::json!({
            "resourceType": "Condition",
            "code": {"text": "Hypertension"},
            "subject": {"reference": "Patient/p1"},
            "onsetAge": {"value": 52.0, "comparator": "~~"}
        });
        let err = Condition::from_payload(json).unwrap_err();
        assert!(err.to_string().contains("onsetAge"), "{err}");
    }
}
