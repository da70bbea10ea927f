//! The `/metadata` document: which resource types this service exposes and
//! what can be done with each.

use serde::Serialize;

use crate::conformance::SUPPORTED_RESOURCE_TYPES;

const FHIR_VERSION: &str = "4.0.1";

/// Interactions per resource type. Types not listed are only validated
/// through `$validate` and get `VALIDATE_ONLY`.
const INTERACTIONS: &[(&str, &[&str])] = &[
    ("Patient", &["create", "read", "search-type"]),
    ("Encounter", &["create", "read", "update", "search-type"]),
    ("Observation", &["create", "search-type"]),
    ("Condition", &["create", "search-type"]),
    ("AllergyIntolerance", &["create", "read", "search-type"]),
    ("MedicationStatement", &["search-type"]),
    ("Organization", &["create"]),
    ("EpisodeOfCare", &["create", "read", "update"]),
];

const VALIDATE_ONLY: &[&str] = &[];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    resource_type: &'static str,
    status: &'static str,
    kind: &'static str,
    fhir_version: &'static str,
    format: [&'static str; 1],
    pub rest: Vec<RestCapability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestCapability {
    mode: &'static str,
    pub resource: Vec<ResourceCapability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceCapability {
    #[serde(rename = "type")]
    pub resource_type: &'static str,
    pub interaction: Vec<Interaction>,
    operation: [Operation; 1],
}

#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub code: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct Operation {
    name: &'static str,
    definition: &'static str,
}

const VALIDATE_OPERATION: Operation = Operation {
    name: "validate",
    definition: "http://hl7.org/fhir/OperationDefinition/Resource-validate",
};

fn resource_capability(resource_type: &'static str) -> ResourceCapability {
    let codes = INTERACTIONS
        .iter()
        .find_map(|(name, codes)| (*name == resource_type).then_some(*codes))
        .unwrap_or(VALIDATE_ONLY);
    ResourceCapability {
        resource_type,
        interaction: codes.iter().map(|&code| Interaction { code }).collect(),
        operation: [VALIDATE_OPERATION],
    }
}

impl CapabilityStatement {
    pub fn new() -> Self {
        Self {
            resource_type: "CapabilityStatement",
            status: "active",
            kind: "instance",
            fhir_version: FHIR_VERSION,
            format: ["json"],
            rest: vec![RestCapability {
                mode: "server",
                resource: SUPPORTED_RESOURCE_TYPES
                    .iter()
                    .map(|&t| resource_capability(t))
                    .collect(),
            }],
        }
    }
}

impl Default for CapabilityStatement {
    fn default() -> Self {
        Self::new()
    }
}
