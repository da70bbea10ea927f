//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clinical_core::{ClinicalError, IssueType, OperationOutcome};

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Clinical(ClinicalError),
    /// A required tenant header was missing
    MissingHeader(String),
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingHeader(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Clinical(err) => match err {
                ClinicalError::Validation(_)
                | ClinicalError::InvalidEnum { .. }
                | ClinicalError::InvalidReference(_)
                | ClinicalError::InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
                ClinicalError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
                ClinicalError::AlreadyExists(_) => StatusCode::CONFLICT,
                ClinicalError::NotFound(_) => StatusCode::NOT_FOUND,
                ClinicalError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                ClinicalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let outcome = match &self {
            AppError::Clinical(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                err.to_outcome()
            }
            AppError::MissingHeader(msg) => OperationOutcome::error(IssueType::Required, msg),
            AppError::BadRequest(msg) => OperationOutcome::invalid(msg),
        };

        (status, Json(outcome)).into_response()
    }
}

impl From<ClinicalError> for AppError {
    fn from(err: ClinicalError) -> Self {
        AppError::Clinical(err)
    }
}
