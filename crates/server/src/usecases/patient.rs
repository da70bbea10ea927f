use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use clinical_core::dto::{
    NameInput, PatientCreatedEvent, PatientInput, PatientOutput, PatientRegistrationInput,
};
use clinical_core::model::{FhirDate, FhirDateTime, Patient};
use clinical_core::translators::{
    contacts_to_contact_points, id_to_identifier, identity_documents_to_identifiers,
    languages_to_communication, marital_status_to_codeable_concept, name_to_human_name,
    next_of_kin_to_contact, phones_to_contact_points, photos_to_attachments,
    physical_postal_addresses_to_fhir_addresses,
};
use clinical_core::{ClinicalError, Result, normalize_msisdn};

use super::ClinicalUseCases;
use crate::infrastructure::events::{PATIENT_CREATED_TOPIC, publish_best_effort};
use crate::infrastructure::resources;
use crate::infrastructure::tenant::TenantContext;

const ALREADY_EXISTS: &str = "patient with phone number already exists";

pub(crate) fn patient_output(patient: &Patient) -> PatientOutput {
    PatientOutput {
        id: patient.id.clone().unwrap_or_default(),
        active: patient.active.unwrap_or(false),
        name: patient.display_name(),
        phone_numbers: patient.phone_numbers(),
        gender: patient.gender,
        birth_date: patient.birth_date.as_ref().map(ToString::to_string),
    }
}

impl ClinicalUseCases {
    /// Whether a patient with this phone number is already on file.
    ///
    /// A read followed by a separate create: two concurrent registrations
    /// of the same number can both see `false`.
    pub async fn check_patient_existence_using_phone_number(&self, phone: &str) -> Result<bool> {
        let msisdn = normalize_msisdn(phone, &self.defaults.calling_code)?;
        let params = vec![("phone".to_string(), msisdn)];
        let found = self.infra.fhir.search("Patient", &params).await?;
        Ok(!found.is_empty())
    }

    async fn ensure_phones_unused<'a>(&self, phones: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for phone in phones {
            if self.check_patient_existence_using_phone_number(phone).await? {
                return Err(ClinicalError::AlreadyExists(ALREADY_EXISTS.to_string()));
            }
        }
        Ok(())
    }

    /// Clinician-driven patient creation with trusted phone numbers.
    pub async fn create_patient(&self, ctx: &TenantContext, input: PatientInput) -> Result<PatientOutput> {
        input.validate()?;

        let identifier = identity_documents_to_identifiers(&input.identification_documents, &self.defaults)?;
        let phones = input
            .phone_numbers
            .iter()
            .map(|p| normalize_msisdn(p, &self.defaults.calling_code))
            .collect::<Result<Vec<_>>>()?;

        self.ensure_phones_unused(phones.iter().map(String::as_str)).await?;

        let at = FhirDateTime::now();
        let name = NameInput {
            first_name: input.first_name,
            last_name: input.last_name,
            other_names: input.other_names,
        };
        let patient = Patient {
            id: Some(Uuid::new_v4().to_string()),
            active: Some(true),
            identifier,
            name: name_to_human_name(&[name], &at),
            telecom: phones_to_contact_points(&phones, &self.defaults, &at)?,
            gender: Some(input.gender),
            birth_date: Some(FhirDate::from(input.birth_date)),
            ..Default::default()
        };

        let created = resources::create(&*self.infra.fhir, &patient).await?;
        info!(patient_id = ?created.id, "Created patient");

        self.publish_patient_created(ctx, &created).await;
        Ok(patient_output(&created))
    }

    /// Self-registration: contacts are OTP-verified and photos uploaded
    /// before anything is written.
    pub async fn register_patient(
        &self,
        ctx: &TenantContext,
        input: PatientRegistrationInput,
    ) -> Result<PatientOutput> {
        input.validate()?;

        self.ensure_phones_unused(input.phone_numbers.iter().map(|p| p.msisdn.as_str()))
            .await?;

        let at = FhirDateTime::now();
        let defaults = &self.defaults;
        let identifier = id_to_identifier(
            &input.identification_documents,
            &input.phone_numbers,
            defaults,
            &at,
        )?;
        let telecom = contacts_to_contact_points(
            &input.phone_numbers,
            &input.emails,
            &*self.infra.verifier,
            defaults,
            &at,
        )
        .await?;
        let contact =
            next_of_kin_to_contact(&input.next_of_kin, &*self.infra.verifier, defaults, &at).await?;
        let photo = photos_to_attachments(&input.photos, &*self.infra.media, defaults, &at).await?;

        let patient = Patient {
            id: Some(Uuid::new_v4().to_string()),
            active: Some(input.active),
            identifier,
            name: name_to_human_name(&input.names, &at),
            telecom,
            gender: Some(input.gender),
            birth_date: Some(FhirDate::from(input.birth_date)),
            address: physical_postal_addresses_to_fhir_addresses(
                &input.physical_addresses,
                &input.postal_addresses,
                defaults,
                &at,
            ),
            marital_status: input.marital_status.map(marital_status_to_codeable_concept),
            photo,
            contact,
            communication: languages_to_communication(&input.languages),
            ..Default::default()
        };

        let created = resources::create(&*self.infra.fhir, &patient).await?;
        info!(patient_id = ?created.id, "Registered patient");

        self.publish_patient_created(ctx, &created).await;
        Ok(patient_output(&created))
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<PatientOutput> {
        let patient: Patient = resources::get(&*self.infra.fhir, patient_id).await?;
        Ok(patient_output(&patient))
    }

    async fn publish_patient_created(&self, ctx: &TenantContext, patient: &Patient) {
        let user_id = match self.infra.tenant.get_logged_in_user(ctx).await {
            Ok(user) => user.user_id,
            Err(e) => {
                warn!(error = %e, "Publishing patient event without a user");
                String::new()
            }
        };
        let id = patient.id.clone().unwrap_or_default();
        let event = PatientCreatedEvent {
            id: id.clone(),
            active: patient.active.unwrap_or(false),
            client_type: String::new(),
            enrollment_date: Some(Utc::now()),
            fhir_patient_id: id,
            emr_health_record_id: String::new(),
            treatment_buddy: String::new(),
            counselled: false,
            organisation: ctx.organization_id.clone(),
            user_id,
            current_facility_id: ctx.facility_id.clone().unwrap_or_default(),
            chv: String::new(),
            caregiver: String::new(),
        };
        publish_best_effort(&*self.infra.events, PATIENT_CREATED_TOPIC, &event).await;
    }
}
