//! clinical-core: FHIR clinical resource model and translators
//!
//! This crate holds everything that does not touch the network: the typed
//! resource model with its validated code sets, the Encounter lifecycle,
//! translators from application inputs to FHIR structures, and the error
//! and OperationOutcome types shared with the server.

pub mod bundle;
pub mod capability;
pub mod conformance;
pub mod defaults;
pub mod dto;
pub mod error;
pub mod model;
pub mod outcome;
pub mod phone;
pub mod reference;
pub mod translators;

pub use bundle::{Bundle, BundleEntry, BundleLink};
pub use capability::CapabilityStatement;
pub use conformance::check_conformance;
pub use defaults::RegistrationDefaults;
pub use error::{ClinicalError, Result};
pub use model::Resource;
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use phone::normalize_msisdn;
pub use reference::{LiteralReference, id_from_reference};
pub use translators::{ContactVerifier, MediaUploader};
