use crate::model::{
    CodeableConcept, Coding, Language, MaritalStatus, PatientCommunication, RelationshipType,
};

const MARITAL_STATUS_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus";
const RELATIONSHIP_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0131";

fn user_selected(system: &str, code: &str, display: &str) -> CodeableConcept {
    let mut coding = Coding::new(system, code, display);
    coding.user_selected = Some(true);
    CodeableConcept {
        coding: vec![coding],
        text: Some(display.to_string()),
    }
}

/// Display text for a marital status code.
///
/// Unlike parsing, an unrecognised code degrades to `"unknown"`.
pub fn marital_status_display(code: &str) -> &'static str {
    code.parse::<MaritalStatus>()
        .map(|status| status.display())
        .unwrap_or("unknown")
}

/// Display text for a relationship code, `"unknown"` when unrecognised
pub fn relationship_type_display(code: &str) -> &'static str {
    code.parse::<RelationshipType>()
        .map(|rel| rel.display())
        .unwrap_or("unknown")
}

pub fn marital_status_to_codeable_concept(status: MaritalStatus) -> CodeableConcept {
    user_selected(
        MARITAL_STATUS_SYSTEM,
        status.as_str(),
        marital_status_display(status.as_str()),
    )
}

pub fn relationship_type_to_codeable_concept(rel: RelationshipType) -> CodeableConcept {
    user_selected(
        RELATIONSHIP_SYSTEM,
        rel.as_str(),
        relationship_type_display(rel.as_str()),
    )
}

/// Communication preferences for the given languages, none marked preferred.
pub fn languages_to_communication(languages: &[Language]) -> Vec<PatientCommunication> {
    languages
        .iter()
        .map(|lang| PatientCommunication {
            language: user_selected(Language::SYSTEM, lang.as_str(), lang.display()),
            preferred: Some(false),
        })
        .collect()
}
