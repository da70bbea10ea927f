use tracing::info;

use clinical_core::dto::{AllergyInput, AllergyOutput, AllergyReactionOutput, TerminologyOutput};
use clinical_core::model::{
    AllergyIntolerance, AllergyIntoleranceReaction, AllergyIntoleranceType, CodeableConcept,
    Coding, Encounter, FhirDateTime, Reference,
};
use clinical_core::{ClinicalError, Resource, Result};

use super::ClinicalUseCases;
use crate::infrastructure::resources;
use crate::infrastructure::tenant::TenantContext;

const CLINICAL_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-clinical";
const VERIFICATION_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-verification";

/// Terms returned by one allergen search
const ALLERGEN_SEARCH_LIMIT: usize = 20;

fn first_coding(concept: Option<&CodeableConcept>) -> (String, String, String) {
    let coding = concept.and_then(|c| c.coding.first());
    let name = concept
        .and_then(|c| c.text.clone())
        .or_else(|| coding.and_then(|c| c.display.clone()))
        .unwrap_or_default();
    (
        coding.and_then(|c| c.code.clone()).unwrap_or_default(),
        name,
        coding.and_then(|c| c.system.clone()).unwrap_or_default(),
    )
}

pub(crate) fn allergy_output(allergy: &AllergyIntolerance) -> Result<AllergyOutput> {
    let (code, name, system) = first_coding(allergy.code.as_ref());
    let reaction = allergy.reaction.first().map(|r| {
        let (code, name, system) = first_coding(r.manifestation.first());
        AllergyReactionOutput {
            code,
            name,
            system,
            severity: r.severity,
        }
    });
    let encounter_id = match &allergy.encounter {
        Some(reference) => Some(reference.literal()?.id),
        None => None,
    };

    Ok(AllergyOutput {
        id: allergy.id.clone().unwrap_or_default(),
        patient_id: allergy.patient.literal()?.id,
        encounter_id,
        code,
        name,
        system,
        reaction,
    })
}

impl ClinicalUseCases {
    /// Record an allergy, and optionally the reaction it caused, during an
    /// open encounter.
    pub async fn create_allergy_intolerance(
        &self,
        ctx: &TenantContext,
        input: AllergyInput,
    ) -> Result<AllergyOutput> {
        input.validate()?;

        let encounter = self.open_encounter(&input.encounter_id).await?;
        let patient = encounter.subject.clone().ok_or_else(|| {
            ClinicalError::validation(format!("encounter {} has no subject", input.encounter_id))
        })?;
        let substance = self.concept(&input.code).await?;
        let reaction = match &input.reaction {
            Some(reaction) => {
                let manifestation = self.concept(&reaction.code).await?;
                Some(AllergyIntoleranceReaction {
                    manifestation: vec![self.concept_to_codeable_concept(&manifestation)],
                    severity: reaction.severity,
                    ..Default::default()
                })
            }
            None => None,
        };
        let (_, meta) = self.tenant_tags(ctx).await?;

        let mut allergy = AllergyIntolerance::new(patient);
        allergy.meta = Some(meta);
        allergy.type_ = Some(AllergyIntoleranceType::Allergy);
        allergy.clinical_status = Some(CodeableConcept::from_coding(Coding::new(
            CLINICAL_STATUS_SYSTEM,
            "active",
            "Active",
        )));
        allergy.verification_status = Some(CodeableConcept::from_coding(Coding::new(
            VERIFICATION_STATUS_SYSTEM,
            "confirmed",
            "Confirmed",
        )));
        allergy.code = Some(self.concept_to_codeable_concept(&substance));
        allergy.encounter = Some(Reference::to(Encounter::RESOURCE_TYPE, &input.encounter_id));
        allergy.recorded_date = Some(FhirDateTime::now());
        allergy.reaction = reaction.into_iter().collect();

        let created = resources::create(&*self.infra.fhir, &allergy).await?;
        info!(allergy_id = ?created.id, encounter_id = %input.encounter_id, "Created allergy intolerance");
        allergy_output(&created)
    }

    pub async fn get_allergy_intolerance(&self, id: &str) -> Result<AllergyOutput> {
        let allergy: AllergyIntolerance = resources::get(&*self.infra.fhir, id).await?;
        allergy_output(&allergy)
    }

    /// Allergen terms whose name matches `name`, for use as allergy codes.
    pub async fn search_allergy(&self, name: &str) -> Result<Vec<TerminologyOutput>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClinicalError::validation("name is required"));
        }

        let concepts = self
            .infra
            .terminology
            .search_concepts(
                &self.defaults.terminology_org,
                &self.defaults.terminology_source,
                name,
                None,
                ALLERGEN_SEARCH_LIMIT,
            )
            .await?;
        let system = self.defaults.concept_system();
        Ok(concepts
            .into_iter()
            .map(|concept| TerminologyOutput {
                code: concept.id,
                system: system.clone(),
                name: concept.display_name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fakes::{Fakes, seed_encounter, tenant};
    use super::*;
    use clinical_core::dto::ReactionInput;
    use clinical_core::model::ReactionSeverity;

    #[tokio::test]
    async fn test_create_and_read_allergy() {
        let fakes = Fakes::new();
        seed_encounter(&fakes.fhir, "e1", "arrived");
        let usecases = fakes.usecases();
        let input = AllergyInput {
            code: "162298".into(),
            encounter_id: "e1".into(),
            reaction: Some(ReactionInput {
                code: "512".into(),
                severity: Some(ReactionSeverity::Moderate),
            }),
        };

        let created = usecases.create_allergy_intolerance(&tenant(), input).await.unwrap();
        assert_eq!(created.patient_id, "p1");
        assert_eq!(created.code, "162298");
        let reaction = created.reaction.clone().unwrap();
        assert_eq!(reaction.code, "512");
        assert_eq!(reaction.severity, Some(ReactionSeverity::Moderate));
        assert_eq!(
            *fakes.terminology.lookups.lock().unwrap(),
            vec!["162298".to_string(), "512".to_string()]
        );

        let read = usecases.get_allergy_intolerance(&created.id).await.unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn test_blank_reaction_code_is_rejected() {
        let fakes = Fakes::new();
        let input = AllergyInput {
            code: "162298".into(),
            encounter_id: "e1".into(),
            reaction: Some(ReactionInput { code: "".into(), severity: None }),
        };
        let err = fakes.usecases().create_allergy_intolerance(&tenant(), input).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_search_allergy() {
        let fakes = Fakes::new();
        fakes.terminology.add_concept("81724", "Penicillin", "Drug");
        fakes.terminology.add_concept("162536", "Peanuts", "Misc");
        fakes.terminology.add_concept("5088", "Temperature (C)", "Finding");
        let usecases = fakes.usecases();

        let found = usecases.search_allergy("  PEN ").await.unwrap();
        assert_eq!(
            found,
            vec![TerminologyOutput {
                code: "81724".into(),
                system: "/orgs/CIEL/sources/CIEL/concepts".into(),
                name: "Penicillin".into(),
            }]
        );
        assert_eq!(fakes.terminology.searches.lock().unwrap()[0].0, "PEN");

        assert!(usecases.search_allergy("   ").await.unwrap_err().is_validation());
        assert_eq!(fakes.terminology.searches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_allergy_terminology_down() {
        let fakes = Fakes::new();
        fakes.terminology.fail();
        let err = fakes.usecases().search_allergy("penicillin").await.unwrap_err();
        assert!(matches!(err, ClinicalError::Upstream { .. }));
    }
}
