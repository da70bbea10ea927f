use serde::{Deserialize, Serialize};

use super::choice::{Medication, MedicationEffective};
use super::datatypes::{Annotation, CodeableConcept, Dosage, Identifier, Meta, Reference};
use super::enums::MedicationStatementStatus;
use super::primitives::FhirDateTime;

/// A record of a medication being taken by a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub based_on: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub part_of: Vec<Reference>,
    pub status: MedicationStatementStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_reason: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CodeableConcept>,
    #[serde(flatten, deserialize_with = "crate::model::choice::required")]
    pub medication: Medication,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Reference>,
    #[serde(flatten, deserialize_with = "crate::model::choice::optional")]
    pub effective: Option<MedicationEffective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_asserted: Option<FhirDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_source: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived_from: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_code: Vec<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_reference: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage: Vec<Dosage>,
}

super::impl_resource!(MedicationStatement, "MedicationStatement");

impl MedicationStatement {
    /// When the medication was taken, or when a period of use began
    pub fn effective_at(&self) -> Option<&FhirDateTime> {
        match self.effective.as_ref()? {
            MedicationEffective::DateTime(dt) => Some(dt),
            MedicationEffective::Period(p) => p.start.as_ref(),
        }
    }
}
