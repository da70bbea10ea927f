use crate::defaults::RegistrationDefaults;
use crate::dto::{IdentificationDocument, IdentityDocumentInput, NameInput, PhoneNumberInput, PhysicalAddress, PostalAddress};
use crate::error::Result;
use crate::model::{
    Address, AddressType, CodeableConcept, Coding, FhirDateTime, HumanName, HumanNameUse,
    IdentificationDocumentType, Identifier, IdentifierUse,
};
use crate::phone::normalize_msisdn;

use super::default_period;

/// One official HumanName per supplied name, with `Text` as `Last, First Other`.
pub fn name_to_human_name(names: &[NameInput], at: &FhirDateTime) -> Vec<HumanName> {
    names
        .iter()
        .map(|name| {
            let other = name.other_names.as_deref().unwrap_or_default();
            let text = format!("{}, {} {}", name.last_name, name.first_name, other);
            HumanName {
                use_: Some(HumanNameUse::Official),
                text: Some(text.trim_end().to_string()),
                family: Some(name.last_name.clone()),
                given: vec![name.first_name.clone()],
                period: Some(default_period(at)),
                ..Default::default()
            }
        })
        .collect()
}

fn self_coded_identifier(
    value: &str,
    system: &str,
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Identifier {
    let coding = Coding {
        system: Some(defaults.identification_document_system.clone()),
        version: Some(defaults.coding_version.clone()),
        code: Some(value.to_string()),
        display: Some(value.to_string()),
        user_selected: Some(true),
    };
    Identifier {
        use_: Some(IdentifierUse::Official),
        type_: Some(CodeableConcept {
            coding: vec![coding],
            text: Some(value.to_string()),
        }),
        system: Some(system.to_string()),
        value: Some(value.to_string()),
        period: Some(default_period(at)),
        assigner: None,
    }
}

/// Identifiers for identification documents and (verified) phone numbers.
///
/// Documents and phones are independent: either list may be empty and the
/// other still produces identifiers. A phone that does not normalise fails
/// the whole call.
pub fn id_to_identifier(
    documents: &[IdentificationDocument],
    phones: &[PhoneNumberInput],
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Result<Vec<Identifier>> {
    let mut output = Vec::with_capacity(documents.len() + phones.len());

    for doc in documents {
        output.push(self_coded_identifier(
            &doc.document_number,
            &defaults.identification_document_system,
            defaults,
            at,
        ));
    }

    for phone in phones {
        let normalized = normalize_msisdn(&phone.msisdn, &defaults.calling_code)?;
        output.push(self_coded_identifier(
            &normalized,
            &defaults.msisdn_system,
            defaults,
            at,
        ));
    }

    Ok(output)
}

/// Identifiers typed with the HL7 v2-0203 code of each document type.
///
/// An unknown document type fails with an error naming it.
pub fn identity_documents_to_identifiers(
    documents: &[IdentityDocumentInput],
    defaults: &RegistrationDefaults,
) -> Result<Vec<Identifier>> {
    documents
        .iter()
        .map(|doc| {
            let doc_type: IdentificationDocumentType = doc.document_type.parse()?;
            let coding = Coding {
                system: Some(defaults.identifier_type_system.clone()),
                code: Some(doc_type.identifier_type_code().to_string()),
                ..Default::default()
            };
            Ok(Identifier {
                use_: Some(IdentifierUse::Official),
                type_: Some(CodeableConcept {
                    coding: vec![coding],
                    text: None,
                }),
                system: Some(defaults.patient_identifier_system.clone()),
                value: Some(doc.number.clone()),
                ..Default::default()
            })
        })
        .collect()
}

/// One Address per postal and per physical address, postal first.
pub fn physical_postal_addresses_to_fhir_addresses(
    physical: &[PhysicalAddress],
    postal: &[PostalAddress],
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Vec<Address> {
    let base = |type_: AddressType| Address {
        use_: Some(defaults.address_use),
        type_: Some(type_),
        country: Some(defaults.country.clone()),
        period: Some(default_period(at)),
        ..Default::default()
    };

    let postal_addresses = postal.iter().map(|p| Address {
        text: Some(format!("{}\n{}", p.postal_address, p.postal_code)),
        postal_code: Some(p.postal_code.clone()),
        line: vec![p.postal_address.clone()],
        ..base(AddressType::Postal)
    });

    let physical_addresses = physical.iter().map(|p| Address {
        text: Some(format!("{}\n{}", p.maps_code, p.physical_address)),
        postal_code: Some(p.maps_code.clone()),
        line: vec![p.physical_address.clone()],
        ..base(AddressType::Physical)
    });

    postal_addresses.chain(physical_addresses).collect()
}

/// All postal and physical addresses folded into a single Address.
///
/// Used for patient contacts, which carry one address each. Postal lines
/// (address then code) are joined into the single `line`; physical lines
/// (address then maps code) are joined into `text`. The first postal code
/// becomes the address postal code.
pub fn physical_postal_addresses_to_combined_fhir_address(
    physical: &[PhysicalAddress],
    postal: &[PostalAddress],
    defaults: &RegistrationDefaults,
    at: &FhirDateTime,
) -> Option<Address> {
    if physical.is_empty() && postal.is_empty() {
        return None;
    }

    let postal_lines: Vec<&str> = postal
        .iter()
        .flat_map(|p| [p.postal_address.as_str(), p.postal_code.as_str()])
        .collect();
    let physical_lines: Vec<&str> = physical
        .iter()
        .flat_map(|p| [p.physical_address.as_str(), p.maps_code.as_str()])
        .collect();

    Some(Address {
        use_: Some(defaults.address_use),
        type_: Some(AddressType::Postal),
        text: Some(physical_lines.join("\n")),
        line: vec![postal_lines.join("\n")],
        postal_code: postal.first().map(|p| p.postal_code.clone()),
        country: Some(defaults.country.clone()),
        period: Some(default_period(at)),
        ..Default::default()
    })
}
