//! Clinical use cases.
//!
//! Each operation validates its input locally, then reads, then writes, so
//! a failure before the write step leaves the store untouched. Writes are
//! not rolled back when a request is cancelled afterwards: a persisted
//! resource may outlive its request.

mod allergy;
mod condition;
mod encounter;
mod episode;
mod medical_data;
mod observation;
mod organization;
mod patient;
mod timeline;

#[cfg(test)]
pub(crate) mod fakes;

pub use observation::VitalSign;
pub use timeline::PatientTimeline;

use clinical_core::model::{CodeableConcept, Coding, Encounter, Meta};
use clinical_core::{RegistrationDefaults, Result};

use crate::infrastructure::resources;
use crate::infrastructure::tenant::{TenantContext, TenantIdentifiers};
use crate::infrastructure::terminology::Concept;
use crate::infrastructure::Infrastructure;

/// Entry point for every clinical operation, shared across requests
#[derive(Clone)]
pub struct ClinicalUseCases {
    infra: Infrastructure,
    defaults: RegistrationDefaults,
}

impl ClinicalUseCases {
    pub fn new(infra: Infrastructure, defaults: RegistrationDefaults) -> Self {
        Self { infra, defaults }
    }

    pub fn infrastructure(&self) -> &Infrastructure {
        &self.infra
    }

    pub fn defaults(&self) -> &RegistrationDefaults {
        &self.defaults
    }

    /// Look up a concept in the configured terminology source.
    async fn concept(&self, concept_id: &str) -> Result<Concept> {
        self.infra
            .terminology
            .get_concept(
                &self.defaults.terminology_org,
                &self.defaults.terminology_source,
                concept_id,
                false,
                false,
            )
            .await
    }

    fn concept_to_codeable_concept(&self, concept: &Concept) -> CodeableConcept {
        CodeableConcept::from_coding(Coding::new(
            self.defaults.concept_system(),
            concept.id.clone(),
            concept.display_name.clone(),
        ))
    }

    /// Resource tags naming the caller's organisation, program and facility
    async fn tenant_tags(&self, ctx: &TenantContext) -> Result<(TenantIdentifiers, Meta)> {
        let ids = self.infra.tenant.get_tenant_identifiers(ctx).await?;
        let tags = [
            (&self.defaults.organisation_tag_system, &ids.organization_id),
            (&self.defaults.program_tag_system, &ids.program_id),
            (&self.defaults.facility_tag_system, &ids.facility_id),
        ]
        .into_iter()
        .filter(|(_, code)| !code.is_empty())
        .map(|(system, code)| Coding::new(system.as_str(), code.as_str(), code.as_str()))
        .collect();
        Ok((ids, Meta::tagged(tags)))
    }

    /// Fetch an encounter that still accepts clinical data.
    async fn open_encounter(&self, encounter_id: &str) -> Result<Encounter> {
        let encounter: Encounter = resources::get(&*self.infra.fhir, encounter_id).await?;
        encounter.ensure_accepts_observations()?;
        Ok(encounter)
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::Fakes;
    use super::*;

    #[tokio::test]
    async fn test_tenant_tags_skip_empty_ids() {
        let fakes = Fakes::new();
        fakes.tenant.set_identifiers("org-1", "", "fac-1");
        let usecases = fakes.usecases();

        let (ids, meta) = usecases.tenant_tags(&TenantContext::default()).await.unwrap();
        assert_eq!(ids.organization_id, "org-1");
        let codes: Vec<_> = meta.tag.iter().filter_map(|t| t.code.as_deref()).collect();
        assert_eq!(codes, vec!["org-1", "fac-1"]);
    }

    #[test]
    fn test_concept_coding_uses_terminology_source() {
        let usecases = Fakes::new().usecases();
        let concept = Concept {
            id: "5088".into(),
            display_name: "Temperature (C)".into(),
            concept_class: None,
            datatype: None,
            url: None,
            mappings: vec![],
        };
        let cc = usecases.concept_to_codeable_concept(&concept);
        assert!(cc.has_coding("/orgs/CIEL/sources/CIEL/concepts", "5088"));
        assert_eq!(cc.text.as_deref(), Some("Temperature (C)"));
    }
}
