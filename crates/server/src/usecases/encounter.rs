use std::cmp::Reverse;

use tracing::info;

use clinical_core::dto::{EncounterInput, EncounterOutput};
use clinical_core::model::{
    Encounter, EncounterClass, EncounterStatus, EpisodeOfCare, FhirDateTime, Patient, Reference,
};
use clinical_core::{ClinicalError, Resource, Result};

use super::ClinicalUseCases;
use crate::infrastructure::resources::{self, patient_params};
use crate::infrastructure::tenant::TenantContext;

pub(crate) fn encounter_output(encounter: &Encounter) -> Result<EncounterOutput> {
    let episode_of_care_id = match encounter.episode_of_care.first() {
        Some(reference) => Some(reference.literal()?.id),
        None => None,
    };
    Ok(EncounterOutput {
        id: encounter.id.clone().unwrap_or_default(),
        status: encounter.status,
        class: encounter.encounter_class(),
        patient_id: encounter.patient_id()?,
        episode_of_care_id,
    })
}

impl ClinicalUseCases {
    /// Open an encounter for an existing patient. Defaults to in-progress.
    pub async fn start_encounter(
        &self,
        ctx: &TenantContext,
        input: EncounterInput,
    ) -> Result<EncounterOutput> {
        if input.patient_id.trim().is_empty() {
            return Err(ClinicalError::validation("patientID is required"));
        }
        let status = input.status.unwrap_or(EncounterStatus::InProgress);
        if status.is_terminal() {
            return Err(ClinicalError::validation(format!(
                "an encounter cannot start as {status}"
            )));
        }

        let patient: Patient = resources::get(&*self.infra.fhir, &input.patient_id).await?;
        if let Some(episode_id) = &input.episode_of_care_id {
            self.episode_for_encounter(episode_id, &input.patient_id).await?;
        }
        let (_, meta) = self.tenant_tags(ctx).await?;

        let subject = Reference::to(Patient::RESOURCE_TYPE, &input.patient_id)
            .with_display(patient.display_name());
        let mut encounter = Encounter::start(subject, status, input.class, FhirDateTime::now());
        if let Some(episode) = &input.episode_of_care_id {
            encounter.episode_of_care = vec![Reference::to(EpisodeOfCare::RESOURCE_TYPE, episode)];
        }
        encounter.meta = Some(meta);

        let created = resources::create(&*self.infra.fhir, &encounter).await?;
        info!(encounter_id = ?created.id, patient_id = %input.patient_id, "Started encounter");
        encounter_output(&created)
    }

    /// Move an encounter to `status`, recording the outgoing status in its history.
    pub async fn transition_encounter(
        &self,
        encounter_id: &str,
        status: EncounterStatus,
    ) -> Result<EncounterOutput> {
        let mut encounter: Encounter = resources::get(&*self.infra.fhir, encounter_id).await?;
        let from = encounter.status;
        encounter.transition(status, FhirDateTime::now())?;

        let updated = resources::update(&*self.infra.fhir, &encounter).await?;
        info!(encounter_id, %from, to = %status, "Encounter status changed");
        encounter_output(&updated)
    }

    pub async fn end_encounter(&self, encounter_id: &str) -> Result<EncounterOutput> {
        self.transition_encounter(encounter_id, EncounterStatus::Finished).await
    }

    pub async fn reclassify_encounter(
        &self,
        encounter_id: &str,
        class: EncounterClass,
    ) -> Result<EncounterOutput> {
        let mut encounter: Encounter = resources::get(&*self.infra.fhir, encounter_id).await?;
        encounter.reclassify(class, FhirDateTime::now())?;

        let updated = resources::update(&*self.infra.fhir, &encounter).await?;
        info!(encounter_id, class = %class, "Encounter reclassified");
        encounter_output(&updated)
    }

    /// The patient's encounters, most recently started first.
    pub async fn list_patient_encounters(&self, patient_id: &str) -> Result<Vec<EncounterOutput>> {
        let mut encounters: Vec<Encounter> =
            resources::search(&*self.infra.fhir, &patient_params(patient_id)).await?;
        encounters.sort_by_key(|e| {
            Reverse(
                e.period
                    .as_ref()
                    .and_then(|p| p.start.as_ref())
                    .and_then(FhirDateTime::to_utc),
            )
        });
        encounters.iter().map(encounter_output).collect()
    }
}
