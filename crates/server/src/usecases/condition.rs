use std::cmp::Reverse;

use tracing::info;

use clinical_core::dto::{ConditionInput, ConditionOutput, ConditionPage, Pagination};
use clinical_core::model::{
    Annotation, CodeableConcept, Coding, Condition, ConditionCategory, ConditionClinicalStatus,
    Encounter, FhirDate, FhirDateTime, Onset, Reference,
};
use clinical_core::{ClinicalError, Resource, Result};

use super::ClinicalUseCases;
use crate::infrastructure::resources::{self, patient_params};
use crate::infrastructure::tenant::TenantContext;

fn coded(system: &str, code: &str, display: &str) -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(system, code, display))
}

pub(crate) fn condition_output(condition: &Condition) -> Result<ConditionOutput> {
    let code = condition.code.as_ref();
    let coding = code.and_then(|c| c.coding.first());
    let encounter_id = match &condition.encounter {
        Some(reference) => Some(reference.literal()?.id),
        None => None,
    };
    let onset_date = match &condition.onset {
        Some(Onset::DateTime(dt)) => Some(dt.to_string()),
        Some(Onset::String(s)) => Some(s.clone()),
        _ => None,
    };

    Ok(ConditionOutput {
        id: condition.id.clone().unwrap_or_default(),
        status: condition
            .clinical_status
            .as_ref()
            .and_then(|s| s.first_code())
            .map(str::to_string),
        name: code
            .and_then(|c| c.text.clone())
            .or_else(|| coding.and_then(|c| c.display.clone()))
            .unwrap_or_default(),
        code: coding.and_then(|c| c.code.clone()).unwrap_or_default(),
        system: coding.and_then(|c| c.system.clone()).unwrap_or_default(),
        category: condition
            .category
            .first()
            .and_then(|c| c.first_code())
            .map(str::to_string),
        onset_date,
        recorded_date: condition.recorded_date.as_ref().map(ToString::to_string),
        patient_id: condition.subject.literal()?.id,
        encounter_id,
        note: condition.note.first().map(|n| n.text.clone()),
    })
}

impl ClinicalUseCases {
    /// Record a condition diagnosed during an open encounter.
    pub async fn create_condition(
        &self,
        ctx: &TenantContext,
        input: ConditionInput,
    ) -> Result<ConditionOutput> {
        input.validate()?;

        let encounter = self.open_encounter(&input.encounter_id).await?;
        let subject = encounter.subject.clone().ok_or_else(|| {
            ClinicalError::validation(format!("encounter {} has no subject", input.encounter_id))
        })?;
        let concept = self.concept(&input.code).await?;
        let (_, meta) = self.tenant_tags(ctx).await?;

        let now = FhirDateTime::now();
        let mut condition = Condition::new(subject);
        condition.meta = Some(meta);
        condition.clinical_status = Some(coded(
            ConditionClinicalStatus::SYSTEM,
            input.status.as_str(),
            input.status.as_str(),
        ));
        condition.category = vec![coded(
            ConditionCategory::SYSTEM,
            input.category.as_str(),
            input.category.display(),
        )];
        condition.code = Some(self.concept_to_codeable_concept(&concept));
        condition.encounter = Some(Reference::to(Encounter::RESOURCE_TYPE, &input.encounter_id));
        condition.onset = input
            .onset_date
            .map(|date| Onset::DateTime(FhirDateTime(FhirDate::from(date).to_string())));
        condition.recorded_date = Some(now.clone());
        if let Some(text) = input.note.filter(|n| !n.trim().is_empty()) {
            condition.note = vec![Annotation {
                author: None,
                time: Some(now),
                text,
            }];
        }

        let created = resources::create(&*self.infra.fhir, &condition).await?;
        info!(condition_id = ?created.id, encounter_id = %input.encounter_id, "Created condition");
        condition_output(&created)
    }

    /// One page of the patient's conditions, most recently recorded first.
    pub async fn list_patient_conditions(
        &self,
        patient_id: &str,
        page: Pagination,
    ) -> Result<ConditionPage> {
        page.validate()?;
        let mut conditions: Vec<Condition> =
            resources::search(&*self.infra.fhir, &patient_params(patient_id)).await?;
        conditions.sort_by_key(|c| Reverse(c.recorded_date.as_ref().and_then(FhirDateTime::to_utc)));

        let total_count = conditions.len();
        let conditions = conditions
            .iter()
            .skip(page.offset)
            .take(page.limit)
            .map(condition_output)
            .collect::<Result<Vec<_>>>()?;
        Ok(ConditionPage {
            has_next_page: page.offset.saturating_add(conditions.len()) < total_count,
            conditions,
            total_count,
        })
    }
}
