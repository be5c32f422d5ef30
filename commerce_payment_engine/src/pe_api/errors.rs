use std::fmt::Display;

use log::*;
use thiserror::Error;

use crate::providers::ProviderError;

/// Every failure the public API can report. Each variant maps onto exactly one HTTP status code via [`Self::code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentApiError {
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("Authentication is required for this action")]
    Unauthenticated,
    #[error("Not authorized. {0}")]
    Unauthorized(String),
    #[error("{0} was not found")]
    NotFound(String),
    #[error("The request conflicts with the current state. {0}")]
    InvalidState(String),
    #[error("Unsupported operation. {0}")]
    Unsupported(String),
    #[error("The payment provider reported an error. {0}")]
    ProviderError(String),
    #[error("Internal inconsistency. {0}")]
    InternalInconsistency(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl PaymentApiError {
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Unauthenticated => 401,
            Self::Unauthorized(_) => 403,
            Self::NotFound(_) => 404,
            Self::InvalidState(_) => 409,
            Self::Unsupported(_) => 422,
            Self::ProviderError(_) => 500,
            Self::InternalInconsistency(_) => 500,
            Self::DatabaseError(_) => 500,
        }
    }

    /// Wraps a backend error. Backend errors are always logged, since they are never the caller's fault.
    pub fn database<E: Display>(e: E) -> Self {
        error!("🗃️ Database error: {e}");
        Self::DatabaseError(e.to_string())
    }
}

impl From<ProviderError> for PaymentApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unsupported(p) => Self::Unsupported(format!("{p} does not support this operation")),
            other => Self::ProviderError(other.to_string()),
        }
    }
}
