use gateway_tools::GatewayApiError;
use thiserror::Error;

use crate::db_types::PaymentProcessor;

/// Failure code recorded on a transaction when the gateway does not supply its own.
pub const GENERIC_FAILURE_CODE: &str = "500";

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The payment gateway rejected the request. {message}")]
    Gateway { code: Option<String>, message: String },
    #[error("The wallet payment amount does not match. Expected {expected}, but the gateway reported {reported}")]
    AmountMismatch { expected: String, reported: String },
    #[error("The wallet payment is malformed. {0}")]
    MalformedPayment(String),
    #[error("{0} does not support refunds")]
    Unsupported(PaymentProcessor),
}

impl ProviderError {
    /// The code stored with a failed transaction.
    pub fn failure_code(&self) -> String {
        match self {
            Self::Gateway { code: Some(code), .. } => code.clone(),
            _ => GENERIC_FAILURE_CODE.to_string(),
        }
    }
}

impl From<GatewayApiError> for ProviderError {
    fn from(e: GatewayApiError) -> Self {
        let code = e.gateway_code().map(String::from);
        Self::Gateway { code, message: e.to_string() }
    }
}
