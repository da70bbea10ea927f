//! Application-facing inputs and outputs.
//!
//! These are the simplified shapes API consumers send and receive. The
//! translators turn them into FHIR resources.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{ClinicalError, Result};
use crate::model::{
    AdministrativeGender, AllergyIntolerance, ConditionCategory, ConditionClinicalStatus,
    EncounterClass, EncounterStatus, EpisodeOfCareStatus, IdentificationDocumentType, Language, MaritalStatus, ObservationStatus,
    MedicationStatement, Observation, PhotoContentType, ReactionSeverity, RelationshipType,
};

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClinicalError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub other_names: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationDocument {
    pub document_type: IdentificationDocumentType,
    pub document_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumberInput {
    pub msisdn: String,
    #[serde(default)]
    pub verification_code: Option<String>,
    #[serde(default)]
    pub is_ussd: bool,
    #[serde(default)]
    pub communication_opt_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailInput {
    pub email: String,
    #[serde(default)]
    pub communication_opt_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoInput {
    pub photo_content_type: PhotoContentType,
    pub photo_base64data: String,
    #[serde(default)]
    pub photo_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalAddress {
    pub maps_code: String,
    pub physical_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub postal_address: String,
    pub postal_code: String,
}

/// Next of kin supplied during self-registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextOfKinInput {
    pub names: Vec<NameInput>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumberInput>,
    #[serde(default)]
    pub emails: Vec<EmailInput>,
    #[serde(default)]
    pub physical_addresses: Vec<PhysicalAddress>,
    #[serde(default)]
    pub postal_addresses: Vec<PostalAddress>,
    pub gender: AdministrativeGender,
    pub relationship: RelationshipType,
}

/// Self-registration payload with OTP-verified contacts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRegistrationInput {
    pub names: Vec<NameInput>,
    #[serde(default)]
    pub identification_documents: Vec<IdentificationDocument>,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumberInput>,
    #[serde(default)]
    pub photos: Vec<PhotoInput>,
    #[serde(default)]
    pub emails: Vec<EmailInput>,
    #[serde(default)]
    pub physical_addresses: Vec<PhysicalAddress>,
    #[serde(default)]
    pub postal_addresses: Vec<PostalAddress>,
    pub gender: AdministrativeGender,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub next_of_kin: Vec<NextOfKinInput>,
}

fn default_true() -> bool {
    true
}

impl PatientRegistrationInput {
    pub fn validate(&self) -> Result<()> {
        if self.names.is_empty() {
            return Err(ClinicalError::validation("at least one name is required"));
        }
        for name in &self.names {
            require("firstName", &name.first_name)?;
            require("lastName", &name.last_name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocumentInput {
    /// One of `passport`, `national_id`, `ccc_number`
    #[serde(rename = "type")]
    pub document_type: String,
    pub number: String,
}

/// Clinician-driven patient creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub other_names: Option<String>,
    pub birth_date: NaiveDate,
    pub gender: AdministrativeGender,
    #[serde(default)]
    pub identification_documents: Vec<IdentityDocumentInput>,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

impl PatientInput {
    pub fn validate(&self) -> Result<()> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        if self.birth_date > Utc::now().date_naive() {
            return Err(ClinicalError::validation("birthDate cannot be in the future"));
        }
        for doc in &self.identification_documents {
            require("identification document number", &doc.number)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientOutput {
    pub id: String,
    pub active: bool,
    pub name: String,
    pub phone_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterInput {
    pub patient_id: String,
    #[serde(default)]
    pub episode_of_care_id: Option<String>,
    pub class: EncounterClass,
    #[serde(default)]
    pub status: Option<EncounterStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterStatusInput {
    pub status: EncounterStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterClassInput {
    pub class: EncounterClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterOutput {
    pub id: String,
    pub status: EncounterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<EncounterClass>,
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_of_care_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeOfCareInput {
    pub patient_id: String,
    #[serde(default)]
    pub status: Option<EpisodeOfCareStatus>,
}

impl EpisodeOfCareInput {
    pub fn validate(&self) -> Result<()> {
        require("patientID", &self.patient_id)?;
        match self.status {
            Some(status) if status.is_closed() => Err(ClinicalError::Validation(format!(
                "an episode of care cannot start as {status}"
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeOfCareOutput {
    pub id: String,
    pub status: EpisodeOfCareStatus,
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationInput {
    pub status: ObservationStatus,
    pub encounter_id: String,
    pub value: String,
}

impl ObservationInput {
    pub fn validate(&self) -> Result<()> {
        require("encounterID", &self.encounter_id)?;
        require("value", &self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationOutput {
    pub id: String,
    pub status: ObservationStatus,
    pub name: String,
    pub value: String,
    pub patient_id: String,
    pub encounter_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_recorded: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionInput {
    /// Concept code in the configured terminology source
    pub code: String,
    pub status: ConditionClinicalStatus,
    pub category: ConditionCategory,
    pub encounter_id: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub onset_date: Option<NaiveDate>,
}

impl ConditionInput {
    pub fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("encounterID", &self.encounter_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionOutput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub name: String,
    pub code: String,
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionInput {
    pub code: String,
    #[serde(default)]
    pub severity: Option<ReactionSeverity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyInput {
    pub code: String,
    pub encounter_id: String,
    #[serde(default)]
    pub reaction: Option<ReactionInput>,
}

impl AllergyInput {
    pub fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("encounterID", &self.encounter_id)?;
        if let Some(reaction) = &self.reaction {
            require("reaction code", &reaction.code)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyReactionOutput {
    pub code: String,
    pub name: String,
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<ReactionSeverity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyOutput {
    pub id: String,
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<String>,
    pub code: String,
    pub name: String,
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<AllergyReactionOutput>,
}

/// Facility details used to create an Organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub code: i64,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub description: String,
}

impl FacilityInput {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }
}

/// A coded term from the terminology service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminologyOutput {
    pub code: String,
    pub system: String,
    pub name: String,
}

/// The latest entries of each clinical summary section, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalData {
    pub regimen: Vec<MedicationStatement>,
    pub allergies: Vec<AllergyIntolerance>,
    pub weight: Vec<Observation>,
    pub bmi: Vec<Observation>,
    pub viral_load: Vec<Observation>,
    pub cd4_count: Vec<Observation>,
}

/// Largest page any list endpoint returns
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

impl Pagination {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(ClinicalError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionPage {
    pub conditions: Vec<ConditionOutput>,
    pub total_count: usize,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthTimelineInput {
    pub patient_id: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// One page of the merged timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthTimeline {
    pub timeline: Vec<Map<String, JsonValue>>,
    pub total_count: usize,
    /// Resource families whose query failed; their entries are missing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_resource_types: Vec<String>,
}

/// Request to the media service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInput {
    pub title: String,
    pub content_type: String,
    pub language: String,
    pub base64data: String,
    pub filename: String,
}

/// Media service response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub base64data: String,
    #[serde(default)]
    pub content_type: String,
}

/// Published after a patient record is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCreatedEvent {
    pub id: String,
    pub active: bool,
    pub client_type: String,
    pub enrollment_date: Option<DateTime<Utc>>,
    pub fhir_patient_id: String,
    pub emr_health_record_id: String,
    pub treatment_buddy: String,
    pub counselled: bool,
    pub organisation: String,
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(rename = "current_facility")]
    pub current_facility_id: String,
    pub chv: String,
    pub caregiver: String,
}

/// Published after a vital sign is recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSignEvent {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    #[serde(rename = "organizationID")]
    pub organization_id: String,
    pub name: String,
    #[serde(rename = "conceptId")]
    pub concept_id: Option<String>,
    pub value: String,
    pub date: DateTime<Utc>,
}
