use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use pulse_core::error::error_response;

use crate::domain::ledger::LedgerError;

/// Access service error variants.
#[derive(Debug, thiserror::Error)]
pub enum AccessServiceError {
    #[error("code table unavailable: {0}")]
    Configuration(String),
    #[error("ledger storage is unreadable: {0}")]
    StorageRead(String),
    #[error("no access codes available, try again later")]
    NoCodesAvailable,
    #[error("access code not found")]
    CodeNotFound,
    #[error("access code already used")]
    CodeAlreadyUsed,
    #[error("access code could not be delivered: {0}")]
    Delivery(String),
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),
    #[error("the survey is closed")]
    SurveyClosed,
    #[error("invalid email address")]
    InvalidIdentity,
    #[error("invalid ballot: {0}")]
    InvalidBallot(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccessServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION",
            Self::StorageRead(_) => "STORAGE_READ",
            Self::NoCodesAvailable => "NO_CODES_AVAILABLE",
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::CodeAlreadyUsed => "CODE_ALREADY_USED",
            Self::Delivery(_) => "DELIVERY_FAILED",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::SurveyClosed => "SURVEY_CLOSED",
            Self::InvalidIdentity => "INVALID_IDENTITY",
            Self::InvalidBallot(_) => "INVALID_BALLOT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidIdentity | Self::InvalidBallot(_) => StatusCode::BAD_REQUEST,
            Self::CodeNotFound => StatusCode::NOT_FOUND,
            Self::CodeAlreadyUsed => StatusCode::CONFLICT,
            Self::SurveyClosed => StatusCode::GONE,
            Self::NoCodesAvailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
            Self::Configuration(_)
            | Self::StorageRead(_)
            | Self::InvariantViolation(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LedgerError> for AccessServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Exhausted => Self::NoCodesAvailable,
            LedgerError::UnknownCode(_) => Self::CodeNotFound,
            LedgerError::InvariantViolation(msg) => Self::InvariantViolation(msg),
            LedgerError::Inconsistent(msg) => Self::StorageRead(msg),
        }
    }
}

impl IntoResponse for AccessServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected user errors and stay out of the log.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
            }
            Self::InvariantViolation(msg) => {
                tracing::error!(error = %msg, kind = "INVARIANT_VIOLATION", "ledger invariant violated");
            }
            Self::Configuration(_) | Self::StorageRead(_) | Self::Delivery(_) => {
                tracing::error!(error = %self, kind = self.kind(), "request failed");
            }
            _ => {}
        }
        // Internal details never leave the service.
        let message = match &self {
            Self::Configuration(_) | Self::StorageRead(_) | Self::InvariantViolation(_) => {
                "internal error".to_owned()
            }
            Self::Delivery(_) => "access code could not be delivered, try again".to_owned(),
            other => other.to_string(),
        };
        error_response(status, self.kind(), message)
    }
}
