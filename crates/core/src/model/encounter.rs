//! Encounter resource and its lifecycle.
//!
//! ```text
//! planned -> arrived -> triaged -> in-progress <-> onleave
//!                                      |             |
//!                                      +--> finished <+
//! ```
//! `cancelled` and `entered-in-error` end any non-terminal encounter.
//! `unknown` may move anywhere, but nothing moves into `unknown`.
//!
//! History is append-only: each transition appends the outgoing status (or
//! class) together with the period it was active.

use serde::{Deserialize, Serialize};

use super::datatypes::{CodeableConcept, Coding, Duration, Identifier, Meta, Period, Reference};
use super::enums::{EncounterClass, EncounterLocationStatus, EncounterStatus};
use super::primitives::FhirDateTime;
use crate::error::{ClinicalError, Result};

impl EncounterStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EncounterStatus::Finished | EncounterStatus::Cancelled | EncounterStatus::EnteredInError
        )
    }

    /// Whether clinical data may still be attached to an encounter in this state
    pub fn accepts_observations(&self) -> bool {
        !self.is_terminal()
    }

    fn progress_rank(&self) -> Option<u8> {
        match self {
            EncounterStatus::Planned => Some(0),
            EncounterStatus::Arrived => Some(1),
            EncounterStatus::Triaged => Some(2),
            EncounterStatus::InProgress => Some(3),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: EncounterStatus) -> bool {
        use EncounterStatus::*;

        if self.is_terminal() || next == Unknown || *self == next {
            return false;
        }
        if matches!(next, Cancelled | EnteredInError) || *self == Unknown {
            return true;
        }
        match (self, next) {
            (InProgress, OnLeave) | (OnLeave, InProgress) => true,
            (InProgress, Finished) | (OnLeave, Finished) => true,
            (from, to) => match (from.progress_rank(), to.progress_rank()) {
                (Some(a), Some(b)) => b > a,
                _ => false,
            },
        }
    }
}

/// An interaction between a patient and healthcare provider(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: EncounterStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_history: Vec<EncounterStatusHistory>,
    pub class: Coding,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_history: Vec<EncounterClassHistory>,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episode_of_care: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<EncounterParticipant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<Duration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_code: Vec<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnosis: Vec<EncounterDiagnosis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospitalization: Option<EncounterHospitalization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<EncounterLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Reference>,
}

super::impl_resource!(Encounter, "Encounter");

impl Encounter {
    /// A new encounter for the subject, started at `at`.
    pub fn start(
        subject: Reference,
        status: EncounterStatus,
        class: EncounterClass,
        at: FhirDateTime,
    ) -> Self {
        Self {
            id: None,
            meta: None,
            identifier: Vec::new(),
            status,
            status_history: Vec::new(),
            class: class_coding(class),
            class_history: Vec::new(),
            type_: Vec::new(),
            service_type: None,
            priority: None,
            subject: Some(subject),
            episode_of_care: Vec::new(),
            participant: Vec::new(),
            period: Some(Period::starting(at)),
            length: None,
            reason_code: Vec::new(),
            diagnosis: Vec::new(),
            hospitalization: None,
            location: Vec::new(),
            service_provider: None,
            part_of: None,
        }
    }

    fn id_for_messages(&self) -> &str {
        self.id.as_deref().unwrap_or("<unsaved>")
    }

    /// Start of whatever is current: the end of the last history entry,
    /// else the encounter start, else `fallback`.
    fn current_since(
        history_end: Option<&FhirDateTime>,
        period: Option<&Period>,
        fallback: &FhirDateTime,
    ) -> FhirDateTime {
        history_end
            .or_else(|| period.and_then(|p| p.start.as_ref()))
            .unwrap_or(fallback)
            .clone()
    }

    /// Move to `next`, appending the outgoing status to the history.
    pub fn transition(&mut self, next: EncounterStatus, at: FhirDateTime) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ClinicalError::PreconditionFailed(format!(
                "encounter {} cannot move from {} to {}",
                self.id_for_messages(),
                self.status,
                next
            )));
        }

        let since = Self::current_since(
            self.status_history.last().and_then(|h| h.period.end.as_ref()),
            self.period.as_ref(),
            &at,
        );
        self.status_history.push(EncounterStatusHistory {
            status: self.status,
            period: Period {
                start: Some(since),
                end: Some(at.clone()),
            },
        });
        self.status = next;

        if next.is_terminal() {
            let period = self.period.get_or_insert_with(Period::default);
            if period.end.is_none() {
                period.end = Some(at);
            }
        }
        Ok(())
    }

    /// Change the encounter class, appending the outgoing class to the history.
    pub fn reclassify(&mut self, class: EncounterClass, at: FhirDateTime) -> Result<()> {
        if self.status.is_terminal() {
            return Err(ClinicalError::PreconditionFailed(format!(
                "encounter {} is {} and cannot be reclassified",
                self.id_for_messages(),
                self.status
            )));
        }
        let next = class_coding(class);
        if next == self.class {
            return Err(ClinicalError::PreconditionFailed(format!(
                "encounter {} is already of class {}",
                self.id_for_messages(),
                class
            )));
        }

        let since = Self::current_since(
            self.class_history.last().and_then(|h| h.period.end.as_ref()),
            self.period.as_ref(),
            &at,
        );
        let previous = std::mem::replace(&mut self.class, next);
        self.class_history.push(EncounterClassHistory {
            class: previous,
            period: Period {
                start: Some(since),
                end: Some(at),
            },
        });
        Ok(())
    }

    /// Guard for every clinical write tied to this encounter.
    pub fn ensure_accepts_observations(&self) -> Result<()> {
        if self.status.accepts_observations() {
            Ok(())
        } else {
            Err(ClinicalError::PreconditionFailed(format!(
                "cannot record clinical data against encounter {}: status is {}",
                self.id_for_messages(),
                self.status
            )))
        }
    }

    /// Id of the patient this encounter is about
    pub fn patient_id(&self) -> Result<String> {
        let subject = self.subject.as_ref().ok_or_else(|| {
            ClinicalError::Validation(format!("encounter {} has no subject", self.id_for_messages()))
        })?;
        Ok(subject.literal()?.id)
    }

    pub fn encounter_class(&self) -> Option<EncounterClass> {
        self.class.code.as_deref().and_then(|c| c.parse().ok())
    }
}

pub(crate) fn class_coding(class: EncounterClass) -> Coding {
    Coding::new(EncounterClass::SYSTEM, class.as_str(), class.display())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterStatusHistory {
    pub status: EncounterStatus,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterClassHistory {
    pub class: Coding,
    pub period: Period,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterParticipant {
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterDiagnosis {
    pub condition: Reference,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterHospitalization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_admission_identifier: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admit_source: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re_admission: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diet_preference: Vec<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_arrangement: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discharge_disposition: Option<CodeableConcept>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterLocation {
    pub location: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EncounterLocationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_type: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}
