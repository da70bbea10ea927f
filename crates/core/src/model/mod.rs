//! FHIR resource model.

mod allergy;
mod choice;
mod condition;
mod datatypes;
mod encounter;
mod enums;
mod episode_of_care;
mod medication_statement;
mod observation;
mod organization;
mod patient;
mod primitives;

pub use allergy::{AllergyIntolerance, AllergyIntoleranceReaction};
pub use choice::{
    Abatement, AnnotationAuthor, AsNeeded, DataRequirementSubject, DateFilterValue, Deceased, Dose,
    Effective, Medication, MedicationEffective, ObservationValue, Onset, Rate, TimingBounds,
    UsageContextValue,
};
pub use condition::Condition;
pub use datatypes::*;
pub use encounter::{
    Encounter, EncounterClassHistory, EncounterDiagnosis, EncounterHospitalization,
    EncounterLocation, EncounterParticipant, EncounterStatusHistory,
};
pub use enums::*;
pub use episode_of_care::{EpisodeOfCare, EpisodeOfCareStatusHistory};
pub use medication_statement::MedicationStatement;
pub use observation::{Observation, ObservationComponent, ObservationReferenceRange};
pub use organization::Organization;
pub use patient::{Patient, PatientCommunication, PatientContact};
pub use primitives::{FhirDate, FhirDateTime, parse_lenient};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{ClinicalError, Result};

/// A top-level FHIR resource with a server-assigned logical id.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const RESOURCE_TYPE: &'static str;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);

    /// JSON payload for the remote store, carrying `resourceType`.
    fn to_payload(&self) -> Result<JsonValue> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| ClinicalError::Internal(format!("failed to serialize {}: {}", Self::RESOURCE_TYPE, e)))?;
        if let JsonValue::Object(map) = &mut value {
            map.insert(
                "resourceType".to_string(),
                JsonValue::String(Self::RESOURCE_TYPE.to_string()),
            );
        }
        Ok(value)
    }

    /// Decode a payload, rejecting one that declares another resource type.
    fn from_payload(value: JsonValue) -> Result<Self> {
        if let Some(declared) = value.get("resourceType").and_then(JsonValue::as_str) {
            if declared != Self::RESOURCE_TYPE {
                return Err(ClinicalError::Validation(format!(
                    "expected resourceType {}, got {}",
                    Self::RESOURCE_TYPE,
                    declared
                )));
            }
        }
        serde_json::from_value(value).map_err(|e| {
            ClinicalError::Validation(format!("invalid {} payload: {}", Self::RESOURCE_TYPE, e))
        })
    }
}

macro_rules! impl_resource {
    ($ty:ty, $name:literal) => {
        impl $crate::model::Resource for $ty {
            const RESOURCE_TYPE: &'static str = $name;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }
        }
    };
}

pub(crate) use impl_resource;
