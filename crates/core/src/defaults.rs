//! Registration defaults injected into translators and use cases.

use serde::{Deserialize, Serialize};

use crate::model::{AddressUse, ContactPointUse, Language};

/// Values applied when a registration payload leaves them out.
///
/// Deployments override these through configuration rather than recompiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationDefaults {
    /// ISO country code stamped on addresses
    pub country: String,
    /// Calling code applied to local phone numbers (no leading `+`)
    pub calling_code: String,
    pub address_use: AddressUse,
    pub contact_use: ContactPointUse,
    pub identification_document_system: String,
    pub msisdn_system: String,
    pub identifier_type_system: String,
    pub patient_identifier_system: String,
    pub coding_version: String,
    pub language: Language,
    pub photo_title: String,
    pub photo_filename: String,
    pub terminology_org: String,
    pub terminology_source: String,
    pub organisation_tag_system: String,
    pub program_tag_system: String,
    pub facility_tag_system: String,
}

impl Default for RegistrationDefaults {
    fn default() -> Self {
        Self {
            country: "ke".to_string(),
            calling_code: "254".to_string(),
            address_use: AddressUse::Home,
            contact_use: ContactPointUse::Home,
            identification_document_system: "healthcloud.iddocument".to_string(),
            msisdn_system: "healthcloud.msisdn".to_string(),
            identifier_type_system: "http://terminology.hl7.org/CodeSystem/v2-0203".to_string(),
            patient_identifier_system: "urn:oid:1.2.36.146.595.217.0.1".to_string(),
            coding_version: "0.0.1".to_string(),
            language: Language::English,
            photo_title: "Patient Photo".to_string(),
            photo_filename: "photo.jpg".to_string(),
            terminology_org: "CIEL".to_string(),
            terminology_source: "CIEL".to_string(),
            organisation_tag_system: "http://mycarehub/tenant-identification/organisation"
                .to_string(),
            program_tag_system: "http://mycarehub/tenant-identification/program".to_string(),
            facility_tag_system: "http://mycarehub/tenant-identification/facility".to_string(),
        }
    }
}

impl RegistrationDefaults {
    /// Coding system URL for concepts of the configured terminology source
    pub fn concept_system(&self) -> String {
        format!(
            "/orgs/{}/sources/{}/concepts",
            self.terminology_org, self.terminology_source
        )
    }
}
