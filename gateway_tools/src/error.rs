use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Gateway rejected the request. Error {status} ({}). {message}", .code.as_deref().unwrap_or("no code"))]
    Rejected { status: u16, code: Option<String>, message: String },
    #[error("Could not obtain an access token: {0}")]
    AuthenticationFailed(String),
}

impl GatewayApiError {
    /// The gateway's own error code, if it supplied one (e.g. `card_declined`).
    pub fn gateway_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
