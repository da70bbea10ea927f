use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use tracing::info;

use clinical_core::dto::{ObservationInput, ObservationOutput, VitalSignEvent};
use clinical_core::model::{
    CodeableConcept, Coding, Effective, Encounter, FhirDateTime, Observation, ObservationValue,
    Quantity, Reference,
};
use clinical_core::{ClinicalError, Resource, Result};

use super::ClinicalUseCases;
use crate::infrastructure::events::{VITALS_TOPIC, publish_best_effort};
use crate::infrastructure::resources::{self, patient_params};
use crate::infrastructure::tenant::TenantContext;

const OBSERVATION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";

/// Vital signs with their CIEL concept and value shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalSign {
    Temperature,
    Height,
    Weight,
    RespiratoryRate,
    PulseRate,
    BloodPressure,
    Bmi,
}

impl VitalSign {
    pub const ALL: &'static [VitalSign] = &[
        VitalSign::Temperature,
        VitalSign::Height,
        VitalSign::Weight,
        VitalSign::RespiratoryRate,
        VitalSign::PulseRate,
        VitalSign::BloodPressure,
        VitalSign::Bmi,
    ];

    pub fn concept_id(&self) -> &'static str {
        match self {
            VitalSign::Temperature => "5088",
            VitalSign::Height => "5090",
            VitalSign::Weight => "5089",
            VitalSign::RespiratoryRate => "5242",
            VitalSign::PulseRate => "5087",
            VitalSign::BloodPressure => "5085",
            VitalSign::Bmi => "1342",
        }
    }

    /// URL segment naming the vital
    pub fn slug(&self) -> &'static str {
        match self {
            VitalSign::Temperature => "temperature",
            VitalSign::Height => "height",
            VitalSign::Weight => "weight",
            VitalSign::RespiratoryRate => "respiratory-rate",
            VitalSign::PulseRate => "pulse-rate",
            VitalSign::BloodPressure => "blood-pressure",
            VitalSign::Bmi => "bmi",
        }
    }

    /// UCUM unit of a numeric vital; `None` for free-text readings
    fn unit(&self) -> Option<&'static str> {
        match self {
            VitalSign::Temperature => Some("Cel"),
            VitalSign::Height => Some("cm"),
            VitalSign::Weight => Some("kg"),
            VitalSign::RespiratoryRate | VitalSign::PulseRate => Some("/min"),
            VitalSign::Bmi => Some("kg/m2"),
            VitalSign::BloodPressure => None,
        }
    }

    /// Parse a reading into the vital's value shape.
    pub fn value(&self, raw: &str) -> Result<ObservationValue> {
        let raw = raw.trim();
        match self.unit() {
            Some(unit) => {
                // `f64::from_str` takes "NaN" and "inf", which JSON stores as null.
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        ClinicalError::validation(format!("{} must be numeric, got '{}'", self, raw))
                    })?;
                Ok(ObservationValue::Quantity(Quantity::ucum(value, unit)))
            }
            None => Ok(ObservationValue::String(raw.to_string())),
        }
    }
}

impl fmt::Display for VitalSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for VitalSign {
    type Err = ClinicalError;

    fn from_str(s: &str) -> Result<Self> {
        VitalSign::ALL
            .iter()
            .find(|v| v.slug() == s)
            .copied()
            .ok_or_else(|| ClinicalError::validation(format!("unknown vital sign: {s}")))
    }
}

fn vital_signs_category() -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(
        OBSERVATION_CATEGORY_SYSTEM,
        "vital-signs",
        "Vital Signs",
    ))
}

pub(crate) fn observation_output(observation: &Observation) -> Result<ObservationOutput> {
    let patient_id = match &observation.subject {
        Some(subject) => subject.literal()?.id,
        None => String::new(),
    };
    let encounter_id = match &observation.encounter {
        Some(encounter) => encounter.literal()?.id,
        None => String::new(),
    };
    let name = observation
        .code
        .text
        .clone()
        .or_else(|| observation.code.coding.iter().find_map(|c| c.display.clone()))
        .unwrap_or_default();

    Ok(ObservationOutput {
        id: observation.id.clone().unwrap_or_default(),
        status: observation.status,
        name,
        value: observation.value.as_ref().map(ObservationValue::render).unwrap_or_default(),
        patient_id,
        encounter_id,
        time_recorded: observation.effective_at().map(ToString::to_string),
    })
}

impl ClinicalUseCases {
    /// Record one observation against an open encounter.
    ///
    /// Validates, loads and checks the encounter, resolves the concept and
    /// tenant tags, then writes. Any failure before the write leaves nothing
    /// behind.
    pub async fn record_observation(
        &self,
        ctx: &TenantContext,
        input: ObservationInput,
        concept_id: &str,
        value: ObservationValue,
    ) -> Result<ObservationOutput> {
        input.validate()?;

        let encounter: Encounter = self.open_encounter(&input.encounter_id).await?;
        let patient_id = encounter.patient_id()?;
        let concept = self.concept(concept_id).await?;
        let (tenant, meta) = self.tenant_tags(ctx).await?;

        let mut observation = Observation::new(input.status, self.concept_to_codeable_concept(&concept));
        observation.meta = Some(meta);
        observation.category = vec![vital_signs_category()];
        observation.subject = encounter.subject.clone();
        observation.encounter = Some(Reference::to(Encounter::RESOURCE_TYPE, &input.encounter_id));
        observation.effective = Some(Effective::Instant(FhirDateTime::now()));
        observation.value = Some(value);

        let created = resources::create(&*self.infra.fhir, &observation).await?;
        info!(
            observation_id = ?created.id,
            encounter_id = %input.encounter_id,
            concept_id,
            "Recorded observation"
        );

        let output = observation_output(&created)?;
        let event = VitalSignEvent {
            patient_id,
            organization_id: tenant.organization_id,
            name: concept.display_name,
            concept_id: Some(concept.id),
            value: output.value.clone(),
            date: Utc::now(),
        };
        publish_best_effort(&*self.infra.events, VITALS_TOPIC, &event).await;

        Ok(output)
    }

    pub async fn record_vital_sign(
        &self,
        ctx: &TenantContext,
        vital: VitalSign,
        input: ObservationInput,
    ) -> Result<ObservationOutput> {
        input.validate()?;
        let value = vital.value(&input.value)?;
        self.record_observation(ctx, input, vital.concept_id(), value).await
    }

    pub async fn record_temperature(&self, ctx: &TenantContext, input: ObservationInput) -> Result<ObservationOutput> {
        self.record_vital_sign(ctx, VitalSign::Temperature, input).await
    }

    pub async fn record_height(&self, ctx: &TenantContext, input: ObservationInput) -> Result<ObservationOutput> {
        self.record_vital_sign(ctx, VitalSign::Height, input).await
    }

    pub async fn record_weight(&self, ctx: &TenantContext, input: ObservationInput) -> Result<ObservationOutput> {
        self.record_vital_sign(ctx, VitalSign::Weight, input).await
    }

    pub async fn record_respiratory_rate(&self, ctx: &TenantContext, input: ObservationInput) -> Result<ObservationOutput> {
        self.record_vital_sign(ctx, VitalSign::RespiratoryRate, input).await
    }

    pub async fn record_pulse_rate(&self, ctx: &TenantContext, input: ObservationInput) -> Result<ObservationOutput> {
        self.record_vital_sign(ctx, VitalSign::PulseRate, input).await
    }

    pub async fn record_blood_pressure(&self, ctx: &TenantContext, input: ObservationInput) -> Result<ObservationOutput> {
        self.record_vital_sign(ctx, VitalSign::BloodPressure, input).await
    }

    pub async fn record_bmi(&self, ctx: &TenantContext, input: ObservationInput) -> Result<ObservationOutput> {
        self.record_vital_sign(ctx, VitalSign::Bmi, input).await
    }

    /// The patient's observations, newest first, optionally limited to one concept.
    pub async fn get_patient_observations(
        &self,
        patient_id: &str,
        concept_id: Option<&str>,
    ) -> Result<Vec<ObservationOutput>> {
        let mut params = patient_params(patient_id);
        if let Some(code) = concept_id {
            params.push(("code".to_string(), code.to_string()));
        }
        let mut observations: Vec<Observation> =
            resources::search(&*self.infra.fhir, &params).await?;
        observations.sort_by_key(|o| Reverse(o.effective_at().and_then(FhirDateTime::to_utc)));
        observations.iter().map(observation_output).collect()
    }

    pub async fn get_patient_vital_entries(
        &self,
        patient_id: &str,
        vital: VitalSign,
    ) -> Result<Vec<ObservationOutput>> {
        self.get_patient_observations(patient_id, Some(vital.concept_id())).await
    }
}
