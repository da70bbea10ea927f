use tracing::info;
use uuid::Uuid;

use clinical_core::dto::FacilityInput;
use clinical_core::model::{
    Address, CodeableConcept, Coding, ContactPoint, ContactPointSystem, ContactPointUse,
    Identifier, IdentifierUse, Organization,
};
use clinical_core::Result;

use super::ClinicalUseCases;
use crate::infrastructure::events::{ORGANIZATION_TOPIC, publish_best_effort};
use crate::infrastructure::resources;

/// Kenya Master Facility List code
const FACILITY_CODE_SYSTEM: &str = "http://mycarehub/facility-identification/mfl-code";

impl ClinicalUseCases {
    /// Create an Organization for a healthcare facility and announce it.
    pub async fn create_organization(&self, input: FacilityInput) -> Result<Organization> {
        input.validate()?;

        let code = input.code.to_string();
        let organization = Organization {
            id: Some(input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string())),
            active: Some(input.active),
            name: Some(input.name.clone()),
            identifier: vec![Identifier {
                use_: Some(IdentifierUse::Official),
                type_: Some(CodeableConcept::from_coding(Coding::new(
                    FACILITY_CODE_SYSTEM,
                    code.as_str(),
                    "MFL Code",
                ))),
                system: Some(FACILITY_CODE_SYSTEM.to_string()),
                value: Some(code),
                ..Default::default()
            }],
            telecom: (!input.phone.trim().is_empty())
                .then(|| ContactPoint {
                    system: Some(ContactPointSystem::Phone),
                    value: Some(input.phone.clone()),
                    use_: Some(ContactPointUse::Work),
                    rank: Some(1),
                    period: None,
                })
                .into_iter()
                .collect(),
            address: (!input.county.trim().is_empty())
                .then(|| Address {
                    state: Some(input.county.clone()),
                    country: Some(self.defaults.country.clone()),
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            alias: (!input.description.trim().is_empty())
                .then(|| input.description.clone())
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let created = resources::create(&*self.infra.fhir, &organization).await?;
        info!(organization_id = ?created.id, "Created organization");

        let event = FacilityInput {
            id: created.id.clone(),
            ..input
        };
        publish_best_effort(&*self.infra.events, ORGANIZATION_TOPIC, &event).await;
        Ok(created)
    }
}
