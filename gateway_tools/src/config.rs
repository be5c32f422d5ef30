use std::{fmt::Display, str::FromStr};

use cpg_common::Secret;

pub const STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const PAYPAL_SANDBOX_API_BASE: &str = "https://api.sandbox.paypal.com";
pub const PAYPAL_LIVE_API_BASE: &str = "https://api.paypal.com";

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    /// Override for the gateway's base URL. Only useful for testing against a mock server.
    pub api_base: Option<String>,
}

impl StripeConfig {
    pub fn new<S: Into<String>>(secret_key: S) -> Self {
        Self { secret_key: Secret::new(secret_key.into()), api_base: None }
    }

    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.api_base.as_deref().unwrap_or(STRIPE_API_BASE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaypalEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl FromStr for PaypalEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" | "live" => Ok(Self::Production),
            other => Err(format!("Unknown PayPal environment: {other}")),
        }
    }
}

impl Display for PaypalEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaypalConfig {
    pub client_id: String,
    pub secret: Secret<String>,
    pub environment: PaypalEnvironment,
    /// Override for the gateway's base URL. When unset, the URL is derived from `environment`.
    pub api_base: Option<String>,
}

impl PaypalConfig {
    pub fn new<S: Into<String>>(client_id: S, secret: S, environment: PaypalEnvironment) -> Self {
        Self { client_id: client_id.into(), secret: Secret::new(secret.into()), environment, api_base: None }
    }

    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn base_url(&self) -> &str {
        match (&self.api_base, self.environment) {
            (Some(base), _) => base.as_str(),
            (None, PaypalEnvironment::Sandbox) => PAYPAL_SANDBOX_API_BASE,
            (None, PaypalEnvironment::Production) => PAYPAL_LIVE_API_BASE,
        }
    }
}
