use serde::{Deserialize, Serialize};

use super::datatypes::{CodeableConcept, Identifier, Meta, Period, Reference};
use super::enums::EpisodeOfCareStatus;
use super::primitives::FhirDateTime;
use crate::error::{ClinicalError, Result};

/// A period of care under one organisation's responsibility. Encounters
/// point at it through `Encounter.episodeOfCare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeOfCare {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: EpisodeOfCareStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_history: Vec<EpisodeOfCareStatusHistory>,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<CodeableConcept>,
    pub patient: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub care_manager: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOfCareStatusHistory {
    pub status: EpisodeOfCareStatus,
    pub period: Period,
}

super::impl_resource!(EpisodeOfCare, "EpisodeOfCare");

impl EpisodeOfCare {
    pub fn open(patient: Reference, status: EpisodeOfCareStatus, at: FhirDateTime) -> Self {
        Self {
            id: None,
            meta: None,
            identifier: Vec::new(),
            status,
            status_history: Vec::new(),
            type_: Vec::new(),
            patient,
            managing_organization: None,
            period: Some(Period::starting(at)),
            care_manager: None,
        }
    }

    pub fn patient_id(&self) -> Result<String> {
        Ok(self.patient.literal()?.id)
    }

    /// Fails unless new encounters may be attached to this episode.
    pub fn ensure_active(&self) -> Result<()> {
        if self.status == EpisodeOfCareStatus::Active {
            return Ok(());
        }
        Err(ClinicalError::PreconditionFailed(format!(
            "episode of care {} is {}",
            self.id.as_deref().unwrap_or("<unsaved>"),
            self.status
        )))
    }

    /// Close the episode at `at`, recording the outgoing status.
    pub fn finish(&mut self, at: FhirDateTime) -> Result<()> {
        if self.status.is_closed() {
            return Err(ClinicalError::PreconditionFailed(format!(
                "episode of care {} is already {}",
                self.id.as_deref().unwrap_or("<unsaved>"),
                self.status
            )));
        }

        let since = self
            .status_history
            .last()
            .and_then(|h| h.period.end.clone())
            .or_else(|| self.period.as_ref().and_then(|p| p.start.clone()))
            .unwrap_or_else(|| at.clone());
        self.status_history.push(EpisodeOfCareStatusHistory {
            status: self.status,
            period: Period {
                start: Some(since),
                end: Some(at.clone()),
            },
        });
        self.status = EpisodeOfCareStatus::Finished;
        self.period.get_or_insert_with(Period::default).end = Some(at);
        Ok(())
    }
}
