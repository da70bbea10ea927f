use crate::outcome::{IssueType, OperationOutcome};
use thiserror::Error;

/// Clinical service error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClinicalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("invalid enum value '{value}' for {enum_name}")]
    InvalidEnum {
        enum_name: &'static str,
        value: String,
    },

    #[error("invalid reference '{0}'; expected to have two parts separated by a /")]
    InvalidReference(String),

    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{dependency} error: {message}")]
    Upstream {
        dependency: &'static str,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClinicalError {
    /// Wrap a dependency failure with the operation that triggered it.
    pub fn upstream(
        dependency: &'static str,
        context: impl std::fmt::Display,
        err: impl std::fmt::Display,
    ) -> Self {
        ClinicalError::Upstream {
            dependency,
            message: format!("{}: {}", context, err),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ClinicalError::Validation(msg.into())
    }

    /// True for errors detected locally, before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClinicalError::Validation(_)
                | ClinicalError::InvalidEnum { .. }
                | ClinicalError::InvalidReference(_)
                | ClinicalError::InvalidPhoneNumber(_)
        )
    }

    /// Render the error as a FHIR OperationOutcome.
    pub fn to_outcome(&self) -> OperationOutcome {
        let message = self.to_string();
        match self {
            ClinicalError::Validation(_) | ClinicalError::InvalidPhoneNumber(_) => {
                OperationOutcome::invalid(&message)
            }
            ClinicalError::InvalidEnum { .. } => {
                OperationOutcome::error(IssueType::CodeInvalid, &message)
            }
            ClinicalError::InvalidReference(_) => {
                OperationOutcome::error(IssueType::Value, &message)
            }
            ClinicalError::PreconditionFailed(_) => {
                OperationOutcome::error(IssueType::BusinessRule, &message)
            }
            ClinicalError::AlreadyExists(_) => {
                OperationOutcome::error(IssueType::Duplicate, &message)
            }
            ClinicalError::NotFound(_) => OperationOutcome::not_found(&message),
            ClinicalError::Upstream { .. } => {
                OperationOutcome::error(IssueType::Transient, &message)
            }
            ClinicalError::Internal(_) => OperationOutcome::error(IssueType::Exception, &message),
        }
    }
}

pub type Result<T, E = ClinicalError> = std::result::Result<T, E>;
