use tracing::info;

use clinical_core::dto::{EpisodeOfCareInput, EpisodeOfCareOutput};
use clinical_core::model::{
    Encounter, EncounterStatus, EpisodeOfCare, EpisodeOfCareStatus, FhirDateTime, Patient,
    Reference,
};
use clinical_core::{ClinicalError, Resource, Result};

use super::ClinicalUseCases;
use crate::infrastructure::resources;
use crate::infrastructure::tenant::TenantContext;

pub(crate) fn episode_output(episode: &EpisodeOfCare) -> Result<EpisodeOfCareOutput> {
    let organization_id = match &episode.managing_organization {
        Some(reference) => Some(reference.literal()?.id),
        None => None,
    };
    let period = episode.period.as_ref();
    Ok(EpisodeOfCareOutput {
        id: episode.id.clone().unwrap_or_default(),
        status: episode.status,
        patient_id: episode.patient_id()?,
        organization_id,
        start: period.and_then(|p| p.start.as_ref()).map(ToString::to_string),
        end: period.and_then(|p| p.end.as_ref()).map(ToString::to_string),
    })
}

impl ClinicalUseCases {
    /// Open an episode of care for an existing patient, managed by the
    /// caller's organisation. Defaults to active.
    pub async fn create_episode_of_care(
        &self,
        ctx: &TenantContext,
        input: EpisodeOfCareInput,
    ) -> Result<EpisodeOfCareOutput> {
        input.validate()?;

        let patient: Patient = resources::get(&*self.infra.fhir, &input.patient_id).await?;
        let (ids, meta) = self.tenant_tags(ctx).await?;

        let subject = Reference::to(Patient::RESOURCE_TYPE, &input.patient_id)
            .with_display(patient.display_name());
        let status = input.status.unwrap_or(EpisodeOfCareStatus::Active);
        let mut episode = EpisodeOfCare::open(subject, status, FhirDateTime::now());
        if !ids.organization_id.is_empty() {
            episode.managing_organization = Some(Reference::to("Organization", &ids.organization_id));
        }
        episode.meta = Some(meta);

        let created = resources::create(&*self.infra.fhir, &episode).await?;
        info!(episode_id = ?created.id, patient_id = %input.patient_id, "Opened episode of care");
        episode_output(&created)
    }

    pub async fn get_episode_of_care(&self, episode_id: &str) -> Result<EpisodeOfCareOutput> {
        let episode: EpisodeOfCare = resources::get(&*self.infra.fhir, episode_id).await?;
        episode_output(&episode)
    }

    /// Finish the episode together with every encounter still open under it.
    ///
    /// Encounters are finished first; if one of those writes fails the
    /// episode stays open and the call can be repeated.
    pub async fn end_episode_of_care(&self, episode_id: &str) -> Result<EpisodeOfCareOutput> {
        let mut episode: EpisodeOfCare = resources::get(&*self.infra.fhir, episode_id).await?;
        let now = FhirDateTime::now();
        episode.finish(now.clone())?;

        let params = vec![(
            "episode-of-care".to_string(),
            format!("{}/{}", EpisodeOfCare::RESOURCE_TYPE, episode_id),
        )];
        let encounters: Vec<Encounter> = resources::search(&*self.infra.fhir, &params).await?;
        let mut closed = 0;
        for mut encounter in encounters.into_iter().filter(|e| !e.status.is_terminal()) {
            encounter.transition(EncounterStatus::Finished, now.clone())?;
            resources::update(&*self.infra.fhir, &encounter).await?;
            closed += 1;
        }

        let updated = resources::update(&*self.infra.fhir, &episode).await?;
        info!(episode_id, encounters_finished = closed, "Ended episode of care");
        episode_output(&updated)
    }

    /// Check that new encounters for `patient_id` may be attached to the episode.
    pub(crate) async fn episode_for_encounter(
        &self,
        episode_id: &str,
        patient_id: &str,
    ) -> Result<EpisodeOfCare> {
        let episode: EpisodeOfCare = resources::get(&*self.infra.fhir, episode_id).await?;
        episode.ensure_active()?;
        let owner = episode.patient_id()?;
        if owner != patient_id {
            return Err(ClinicalError::validation(format!(
                "episode of care {episode_id} belongs to another patient"
            )));
        }
        Ok(episode)
    }
}
