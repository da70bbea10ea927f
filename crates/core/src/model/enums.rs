//! Closed FHIR code sets.
//!
//! Every code set parses strictly: an unknown code fails with
//! [`ClinicalError::InvalidEnum`], both through `FromStr` and through serde.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ClinicalError;

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member of the code set, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire code
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn is_valid(code: &str) -> bool {
                code.parse::<$name>().is_ok()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ClinicalError;

            fn from_str(code: &str) -> Result<Self, Self::Err> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err(ClinicalError::InvalidEnum {
                        enum_name: stringify!($name),
                        value: code.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = String::deserialize(deserializer)?;
                code.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

code_enum! {
    /// Postal vs physical address
    AddressType {
        Postal => "postal",
        Physical => "physical",
        Both => "both",
    }
}

code_enum! {
    AddressUse {
        Home => "home",
        Work => "work",
        Temp => "temp",
        Old => "old",
        Billing => "billing",
    }
}

code_enum! {
    /// How a quantity value should be understood relative to the stated value
    QuantityComparator {
        LessThan => "<",
        LessOrEqual => "<=",
        GreaterOrEqual => ">=",
        GreaterThan => ">",
    }
}

code_enum! {
    ContactPointSystem {
        Phone => "phone",
        Fax => "fax",
        Email => "email",
        Pager => "pager",
        Url => "url",
        Sms => "sms",
        Other => "other",
    }
}

code_enum! {
    ContactPointUse {
        Home => "home",
        Work => "work",
        Temp => "temp",
        Old => "old",
        Mobile => "mobile",
    }
}

code_enum! {
    HumanNameUse {
        Usual => "usual",
        Official => "official",
        Temp => "temp",
        Nickname => "nickname",
        Anonymous => "anonymous",
        Old => "old",
        Maiden => "maiden",
    }
}

code_enum! {
    IdentifierUse {
        Usual => "usual",
        Official => "official",
        Temp => "temp",
        Secondary => "secondary",
        Old => "old",
    }
}

code_enum! {
    NarrativeStatus {
        Generated => "generated",
        Extensions => "extensions",
        Additional => "additional",
        Empty => "empty",
    }
}

code_enum! {
    /// UCUM units used by Timing durations and periods
    UnitsOfTime {
        Second => "s",
        Minute => "min",
        Hour => "h",
        Day => "d",
        Week => "wk",
        Month => "mo",
        Year => "a",
    }
}

code_enum! {
    /// Real-world event relating to the schedule
    EventTiming {
        Morning => "MORN",
        EarlyMorning => "MORN.early",
        LateMorning => "MORN.late",
        Noon => "NOON",
        Afternoon => "AFT",
        EarlyAfternoon => "AFT.early",
        LateAfternoon => "AFT.late",
        Evening => "EVE",
        EarlyEvening => "EVE.early",
        LateEvening => "EVE.late",
        Night => "NIGHT",
        AfterSleep => "PHS",
        BeforeSleep => "HS",
        Wake => "WAKE",
        Meal => "C",
        Breakfast => "CM",
        Lunch => "CD",
        Dinner => "CV",
        BeforeMeal => "AC",
        BeforeBreakfast => "ACM",
        BeforeLunch => "ACD",
        BeforeDinner => "ACV",
        AfterMeal => "PC",
        AfterBreakfast => "PCM",
        AfterLunch => "PCD",
        AfterDinner => "PCV",
    }
}

code_enum! {
    SortDirection {
        Ascending => "ascending",
        Descending => "descending",
    }
}

code_enum! {
    AdministrativeGender {
        Male => "male",
        Female => "female",
        Other => "other",
        Unknown => "unknown",
    }
}

code_enum! {
    /// Lifecycle state of an encounter. Transition rules live with [`crate::model::Encounter`].
    EncounterStatus {
        Planned => "planned",
        Arrived => "arrived",
        Triaged => "triaged",
        InProgress => "in-progress",
        OnLeave => "onleave",
        Finished => "finished",
        Cancelled => "cancelled",
        EnteredInError => "entered-in-error",
        Unknown => "unknown",
    }
}

code_enum! {
    /// Lifecycle state of an episode of care
    EpisodeOfCareStatus {
        Planned => "planned",
        Waitlist => "waitlist",
        Active => "active",
        OnHold => "onhold",
        Finished => "finished",
        Cancelled => "cancelled",
        EnteredInError => "entered-in-error",
    }
}

impl EpisodeOfCareStatus {
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            EpisodeOfCareStatus::Finished
                | EpisodeOfCareStatus::Cancelled
                | EpisodeOfCareStatus::EnteredInError
        )
    }
}

code_enum! {
    EncounterLocationStatus {
        Planned => "planned",
        Active => "active",
        Reserved => "reserved",
        Completed => "completed",
    }
}

code_enum! {
    /// HL7 v3 ActCode encounter classes
    EncounterClass {
        Ambulatory => "AMB",
        Emergency => "EMER",
        Field => "FLD",
        HomeHealth => "HH",
        Inpatient => "IMP",
        InpatientAcute => "ACUTE",
        InpatientNonAcute => "NONAC",
        ObservationEncounter => "OBSENC",
        PreAdmission => "PRENC",
        ShortStay => "SS",
        Virtual => "VR",
    }
}

impl EncounterClass {
    pub const SYSTEM: &'static str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";

    pub fn display(&self) -> &'static str {
        match self {
            EncounterClass::Ambulatory => "ambulatory",
            EncounterClass::Emergency => "emergency",
            EncounterClass::Field => "field",
            EncounterClass::HomeHealth => "home health",
            EncounterClass::Inpatient => "inpatient encounter",
            EncounterClass::InpatientAcute => "inpatient acute",
            EncounterClass::InpatientNonAcute => "inpatient non-acute",
            EncounterClass::ObservationEncounter => "observation encounter",
            EncounterClass::PreAdmission => "pre-admission",
            EncounterClass::ShortStay => "short stay",
            EncounterClass::Virtual => "virtual",
        }
    }
}

code_enum! {
    ObservationStatus {
        Registered => "registered",
        Preliminary => "preliminary",
        Final => "final",
        Amended => "amended",
        Corrected => "corrected",
        Cancelled => "cancelled",
        EnteredInError => "entered-in-error",
        Unknown => "unknown",
    }
}

code_enum! {
    AllergyIntoleranceType {
        Allergy => "allergy",
        Intolerance => "intolerance",
    }
}

code_enum! {
    AllergyIntoleranceCategory {
        Food => "food",
        Medication => "medication",
        Environment => "environment",
        Biologic => "biologic",
    }
}

code_enum! {
    AllergyIntoleranceCriticality {
        Low => "low",
        High => "high",
        UnableToAssess => "unable-to-assess",
    }
}

code_enum! {
    ReactionSeverity {
        Mild => "mild",
        Moderate => "moderate",
        Severe => "severe",
    }
}

code_enum! {
    MedicationStatementStatus {
        Active => "active",
        Completed => "completed",
        EnteredInError => "entered-in-error",
        Intended => "intended",
        Stopped => "stopped",
        OnHold => "on-hold",
        Unknown => "unknown",
        NotTaken => "not-taken",
    }
}

code_enum! {
    /// HL7 marital status value set
    MaritalStatus {
        Annulled => "A",
        Divorced => "D",
        Interlocutory => "I",
        LegallySeparated => "L",
        Married => "M",
        Polygamous => "P",
        NeverMarried => "S",
        DomesticPartner => "T",
        Unmarried => "U",
        Widowed => "W",
        Unknown => "UNK",
    }
}

impl MaritalStatus {
    pub fn display(&self) -> &'static str {
        match self {
            MaritalStatus::Annulled => "Annulled",
            MaritalStatus::Divorced => "Divorced",
            MaritalStatus::Interlocutory => "Interlocutory",
            MaritalStatus::LegallySeparated => "Legally Separated",
            MaritalStatus::Married => "Married",
            MaritalStatus::Polygamous => "Polygamous",
            MaritalStatus::NeverMarried => "Never Married",
            MaritalStatus::DomesticPartner => "Domestic Partner",
            MaritalStatus::Unmarried => "unmarried",
            MaritalStatus::Widowed => "Widowed",
            MaritalStatus::Unknown => "unknown",
        }
    }
}

code_enum! {
    /// Relationship of a patient contact to the patient (HL7 v2 table 0131)
    RelationshipType {
        EmergencyContact => "C",
        Employer => "E",
        FederalAgency => "F",
        InsuranceCompany => "I",
        NextOfKin => "N",
        Other => "O",
        StateAgency => "S",
        Unknown => "U",
    }
}

impl RelationshipType {
    pub fn display(&self) -> &'static str {
        match self {
            RelationshipType::EmergencyContact => "Emergency Contact",
            RelationshipType::Employer => "Employer",
            RelationshipType::FederalAgency => "Federal Agency",
            RelationshipType::InsuranceCompany => "Insurance Company",
            RelationshipType::NextOfKin => "Next-of-Kin",
            RelationshipType::Other => "Other",
            RelationshipType::StateAgency => "State Agency",
            RelationshipType::Unknown => "Unknown",
        }
    }
}

code_enum! {
    IdentificationDocumentType {
        Passport => "passport",
        NationalId => "national_id",
        CccNumber => "ccc_number",
    }
}

impl IdentificationDocumentType {
    /// HL7 v2-0203 identifier type code
    pub fn identifier_type_code(&self) -> &'static str {
        match self {
            IdentificationDocumentType::Passport => "PPN",
            IdentificationDocumentType::NationalId => "NI",
            IdentificationDocumentType::CccNumber => "MR",
        }
    }
}

code_enum! {
    Language {
        English => "en",
        Swahili => "sw",
        French => "fr",
    }
}

impl Language {
    pub const SYSTEM: &'static str = "urn:ietf:bcp:47";

    pub fn display(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Swahili => "Swahili",
            Language::French => "French",
        }
    }
}

code_enum! {
    PhotoContentType {
        Png => "image/png",
        Jpeg => "image/jpeg",
        Gif => "image/gif",
    }
}

code_enum! {
    ConditionClinicalStatus {
        Active => "active",
        Recurrence => "recurrence",
        Relapse => "relapse",
        Inactive => "inactive",
        Remission => "remission",
        Resolved => "resolved",
    }
}

impl ConditionClinicalStatus {
    pub const SYSTEM: &'static str = "http://terminology.hl7.org/CodeSystem/condition-clinical";
}

code_enum! {
    ConditionCategory {
        ProblemListItem => "problem-list-item",
        EncounterDiagnosis => "encounter-diagnosis",
    }
}

impl ConditionCategory {
    pub const SYSTEM: &'static str = "http://terminology.hl7.org/CodeSystem/condition-category";

    pub fn display(&self) -> &'static str {
        match self {
            ConditionCategory::ProblemListItem => "Problem List Item",
            ConditionCategory::EncounterDiagnosis => "Encounter Diagnosis",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_matches_declared_codes() {
        for status in EncounterStatus::ALL {
            assert!(EncounterStatus::is_valid(status.as_str()));
        }
        assert!(!EncounterStatus::is_valid("in_progress"));
        assert!(!EncounterStatus::is_valid("FINISHED"));
        assert!(!EncounterStatus::is_valid(""));
        assert!(QuantityComparator::is_valid("<="));
        assert!(!QuantityComparator::is_valid("less_than"));
    }

    #[test]
    fn test_parse_error_names_type_and_value() {
        let err = "done".parse::<ObservationStatus>().unwrap_err();
        assert_eq!(
            err,
            ClinicalError::InvalidEnum {
                enum_name: "ObservationStatus",
                value: "done".to_string(),
            }
        );
    }

    #[test]
    fn test_serde_rejects_unknown_code() {
        let err = serde_json::from_str::<AdministrativeGender>("\"robot\"").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("invalid enum value"));
        assert!(msg.contains("AdministrativeGender"));
        assert!(msg.contains("robot"));

        let ok: AdministrativeGender = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(ok, AdministrativeGender::Female);
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"female\"");
    }

    #[test]
    fn test_display_matches_wire_code() {
        assert_eq!(EncounterStatus::EnteredInError.to_string(), "entered-in-error");
        assert_eq!(EventTiming::EarlyMorning.to_string(), "MORN.early");
        assert_eq!(MaritalStatus::Unknown.as_str(), "UNK");
    }

    #[test]
    fn test_document_type_codes() {
        assert_eq!(IdentificationDocumentType::Passport.identifier_type_code(), "PPN");
        assert_eq!(IdentificationDocumentType::NationalId.identifier_type_code(), "NI");
        assert_eq!(IdentificationDocumentType::CccNumber.identifier_type_code(), "MR");
    }
}
