use tracing::debug;

use crate::defaults::RegistrationDefaults;
use crate::dto::{EmailInput, NextOfKinInput, PhoneNumberInput};
use crate::error::{ClinicalError, Result};
use crate::model::{ContactPoint, ContactPointSystem, FhirDateTime, PatientContact};
use crate::phone::normalize_msisdn;

use super::concepts::relationship_type_to_codeable_concept;
use super::demographics::{name_to_human_name, physical_postal_addresses_to_combined_fhir_address};
use super::{default_period, ContactVerifier};

fn contact_point(
    system: ContactPointSystem,
    value: String,
    rank: u32,
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> ContactPoint {
    ContactPoint {
        system: Some(system),
        value: Some(value),
        use_: Some(defaults.contact_use),
        rank: Some(rank),
        period: Some(default_period(at)),
    }
}

/// Verified phone and email contact points.
///
/// Every non-USSD phone must carry an OTP that the verifier accepts; USSD
/// phones are left out. Any failure aborts the whole batch so no partial
/// list is returned. Ranks run from 1 across phones and then emails.
pub async fn contacts_to_contact_points(
    phones: &[PhoneNumberInput],
    emails: &[EmailInput],
    verifier: &dyn ContactVerifier,
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Result<Vec<ContactPoint>> {
    // Cheap checks first so a bad batch never reaches the verifier.
    let mut pending = Vec::with_capacity(phones.len());
    for phone in phones.iter().filter(|p| !p.is_ussd) {
        let otp = phone
            .verification_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| {
                ClinicalError::validation(format!(
                    "verification code is required for phone {}",
                    phone.msisdn
                ))
            })?;
        let normalized = normalize_msisdn(&phone.msisdn, &defaults.calling_code)?;
        pending.push((normalized, otp));
    }

    let mut output = Vec::with_capacity(pending.len() + emails.len());
    let mut rank = 1;

    for (msisdn, otp) in pending {
        if !verifier.verify_otp(&msisdn, otp).await? {
            return Err(ClinicalError::validation(format!("invalid OTP for {msisdn}")));
        }
        output.push(contact_point(ContactPointSystem::Phone, msisdn, rank, defaults, at));
        rank += 1;
    }

    for email in emails {
        verifier
            .validate_email(&email.email, email.communication_opt_in)
            .await?;
        output.push(contact_point(
            ContactPointSystem::Email,
            email.email.clone(),
            rank,
            defaults,
            at,
        ));
        rank += 1;
    }

    debug!(count = output.len(), "Verified contact points");
    Ok(output)
}

/// Phone contact points for numbers the caller already trusts.
pub fn phones_to_contact_points(
    phones: &[String],
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Result<Vec<ContactPoint>> {
    phones
        .iter()
        .zip(1..)
        .map(|(raw, rank)| {
            let normalized = normalize_msisdn(raw, &defaults.calling_code)?;
            Ok(contact_point(ContactPointSystem::Phone, normalized, rank, defaults, at))
        })
        .collect()
}

/// One PatientContact per next-of-kin entry.
///
/// Next of kin get the same contact verification as the patient, and a single
/// combined address.
pub async fn next_of_kin_to_contact(
    next_of_kin: &[NextOfKinInput],
    verifier: &dyn ContactVerifier,
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Result<Vec<PatientContact>> {
    let mut contacts = Vec::with_capacity(next_of_kin.len());
    for kin in next_of_kin {
        let telecom =
            contacts_to_contact_points(&kin.phone_numbers, &kin.emails, verifier, defaults, at)
                .await?;
        contacts.push(PatientContact {
            relationship: vec![relationship_type_to_codeable_concept(kin.relationship)],
            name: name_to_human_name(&kin.names, at).into_iter().next(),
            telecom,
            address: physical_postal_addresses_to_combined_fhir_address(
                &kin.physical_addresses,
                &kin.postal_addresses,
                defaults,
                at,
            ),
            gender: Some(kin.gender),
            organization: None,
            period: Some(default_period(at)),
        });
    }
    Ok(contacts)
}
