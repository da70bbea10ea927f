use serde::{Deserialize, Serialize};

use super::choice::Onset;
use super::datatypes::{Annotation, CodeableConcept, Identifier, Meta, Reference};
use super::enums::{
    AllergyIntoleranceCategory, AllergyIntoleranceCriticality, AllergyIntoleranceType,
    ReactionSeverity,
};
use super::primitives::FhirDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
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
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<AllergyIntoleranceType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<AllergyIntoleranceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<AllergyIntoleranceCriticality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    pub patient: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(flatten, deserialize_with = "crate::model::choice::optional")]
    pub onset: Option<Onset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<FhirDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorder: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asserter: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_occurrence: Option<FhirDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reaction: Vec<AllergyIntoleranceReaction>,
}

super::impl_resource!(AllergyIntolerance, "AllergyIntolerance");

impl AllergyIntolerance {
    pub fn new(patient: Reference) -> Self {
        Self {
            id: None,
            meta: None,
            identifier: Vec::new(),
            clinical_status: None,
            verification_status: None,
            type_: None,
            category: Vec::new(),
            criticality: None,
            code: None,
            patient,
            encounter: None,
            onset: None,
            recorded_date: None,
            recorder: None,
            asserter: None,
            last_occurrence: None,
            note: Vec::new(),
            reaction: Vec::new(),
        }
    }
}

/// Adverse reaction event linked to exposure to the substance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntoleranceReaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substance: Option<CodeableConcept>,
    #[serde(default)]
    pub manifestation: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset: Option<FhirDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<ReactionSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_route: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;

    #[test]
    fn test_allergy_round_trip() {
        let json = serde_json::json!({
            "resourceType": "AllergyIntolerance",
            "id": "a1",
            "type": "allergy",
            "category": ["medication"],
            "criticality": "high",
            "code": {"coding": [{"system": "/orgs/CIEL/sources/CIEL/concepts", "code": "162298"}], "text": "Penicillin"},
            "patient": {"reference": "Patient/p1"},
            "encounter": {"reference": "Encounter/e1"},
            "onsetDateTime": "2019-05-01",
            "recordedDate": "2024-01-01T08:00:00Z",
            "reaction": [{"manifestation": [{"text": "Hives"}], "severity": "moderate"}]
        });

        let allergy = AllergyIntolerance::from_payload(json.clone()).unwrap();
        assert_eq!(allergy.category, vec![AllergyIntoleranceCategory::Medication]);
        assert_eq!(allergy.reaction[0].severity, Some(ReactionSeverity::Moderate));
        assert_eq!(allergy.to_payload().unwrap(), json);
    }

    #[test]
    fn test_unknown_criticality_is_rejected() {
        let json = serde_json::json!({
            "resourceType": "AllergyIntolerance",
            "patient": {"reference": "Patient/p1"},
            "criticality": "extreme"
        });
        let err = AllergyIntolerance::from_payload(json).unwrap_err();
        assert!(err.to_string().contains("AllergyIntoleranceCriticality"));
    }
}
