use serde::{Deserialize, Serialize};

use super::choice::Deceased;
use super::datatypes::{
    Address, Attachment, CodeableConcept, ContactPoint, HumanName, Identifier, Meta, Narrative,
    Period, Reference,
};
use super::enums::{AdministrativeGender, ContactPointSystem};
use super::primitives::FhirDate;

/// Demographics of a person receiving care
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<FhirDate>,
    #[serde(flatten, deserialize_with = "crate::model::choice::optional")]
    pub deceased: Option<Deceased>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<PatientContact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communication: Vec<PatientCommunication>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub general_practitioner: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Reference>,
}

super::impl_resource!(Patient, "Patient");

impl Patient {
    /// Phone numbers on file, in rank order
    pub fn phone_numbers(&self) -> Vec<String> {
        let mut phones: Vec<&ContactPoint> = self
            .telecom
            .iter()
            .filter(|t| t.system == Some(ContactPointSystem::Phone))
            .collect();
        phones.sort_by_key(|t| t.rank.unwrap_or(u32::MAX));
        phones.into_iter().filter_map(|t| t.value.clone()).collect()
    }

    /// Display name taken from the first recorded name
    pub fn display_name(&self) -> String {
        self.name.first().map(HumanName::display).unwrap_or_default()
    }
}

/// Next of kin, guardian or other party to contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContact {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationship: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<HumanName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCommunication {
    pub language: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContactPointUse, HumanNameUse, Resource};

    #[test]
    fn test_patient_round_trip() {
        let json = serde_json::json!({
            "resourceType": "Patient",
            "id": "5f0ba3a2-2a46-4bd2-8a3d-9e4d2b3f5e0c",
            "active": true,
            "name": [{"use": "official", "family": "Doe", "given": ["Jane"], "text": "Doe, Jane M"}],
            "telecom": [
                {"system": "email", "value": "jane@example.com", "rank": 2},
                {"system": "phone", "value": "+254712345678", "use": "home", "rank": 1}
            ],
            "gender": "female",
            "birthDate": "1990-02-01",
            "deceasedBoolean": false,
            "maritalStatus": {"coding": [{"code": "M", "display": "Married", "userSelected": true}], "text": "Married"},
            "communication": [{"language": {"text": "English"}, "preferred": false}]
        });

        let patient = Patient::from_payload(json.clone()).unwrap();
        assert_eq!(patient.name[0].use_, Some(HumanNameUse::Official));
        assert_eq!(patient.telecom[1].use_, Some(ContactPointUse::Home));
        assert_eq!(patient.deceased, Some(Deceased::Boolean(false)));
        assert_eq!(patient.phone_numbers(), vec!["+254712345678".to_string()]);
        assert_eq!(patient.display_name(), "Doe, Jane M");

        assert_eq!(patient.to_payload().unwrap(), json);
    }

    #[test]
    fn test_rejects_other_resource_type() {
        let json = serde_json::json!({"resourceType": "Encounter", "id": "1"});
        assert!(Patient::from_payload(json).is_err());
    }

    #[test]
    fn test_rejects_unknown_gender() {
        let json = serde_json::json!({"resourceType": "Patient", "gender": "robot"});
        let err = Patient::from_payload(json).unwrap_err();
        assert!(err.to_string().contains("invalid enum value"));
    }
}
