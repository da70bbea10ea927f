//! Conversion of application inputs into FHIR structures.
//!
//! Translators apply [`RegistrationDefaults`](crate::RegistrationDefaults)
//! and take the timestamp to stamp as an argument, so the output depends only
//! on the inputs. The two that need external services take them through the
//! capability traits below.

mod concepts;
mod contacts;
mod demographics;
mod photos;

pub use concepts::{
    languages_to_communication, marital_status_display, marital_status_to_codeable_concept,
    relationship_type_display, relationship_type_to_codeable_concept,
};
pub use contacts::{contacts_to_contact_points, next_of_kin_to_contact, phones_to_contact_points};
pub use demographics::{
    id_to_identifier, identity_documents_to_identifiers, name_to_human_name,
    physical_postal_addresses_to_combined_fhir_address, physical_postal_addresses_to_fhir_addresses,
};
pub use photos::photos_to_attachments;

use async_trait::async_trait;

use crate::dto::{Upload, UploadInput};
use crate::error::Result;
use crate::model::{FhirDateTime, Period};
use crate::reference::id_from_reference;

/// Phone and email verification used by self-registration.
#[async_trait]
pub trait ContactVerifier: Send + Sync {
    /// Check a one-time PIN sent to `msisdn` (already normalised).
    async fn verify_otp(&self, msisdn: &str, otp: &str) -> Result<bool>;

    async fn validate_email(&self, email: &str, communication_opt_in: bool) -> Result<()>;
}

/// Media storage for patient photos.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, input: UploadInput) -> Result<Upload>;
}

/// Open period starting at `at`
pub fn default_period(at: &FhirDateTime) -> Period {
    Period::starting(at.clone())
}

/// Bare patient id from a `Patient/<id>` reference
pub fn patient_id_from_reference(reference: &str) -> Result<String> {
    id_from_reference(reference)
}
