use std::{env, io::Write};

use cpg_common::{
    helpers::{non_empty_env, parse_boolean_flag, parse_env},
    Secret,
};
use gateway_tools::{PaypalConfig, PaypalEnvironment, StripeConfig};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_CPG_HOST: &str = "127.0.0.1";
const DEFAULT_CPG_PORT: u16 = 8080;
const DEFAULT_ADMIN_GROUP: &str = "admin";
const DEFAULT_CONFIRMATION_SUBJECT: &str = "Your order has been received";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty means the engine's default database location
    pub database_url: String,
    /// Run any outstanding database migrations at startup
    pub auto_migrate: bool,
    pub auth: AuthConfig,
    /// Members of this group are administrators
    pub admin_group: String,
    pub stripe: StripeConfig,
    /// Wallet payments are only enabled when PayPal credentials are configured
    pub paypal: Option<PaypalConfig>,
    pub webhooks: WebhookConfig,
    pub mailer: MailerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPG_HOST.to_string(),
            port: DEFAULT_CPG_PORT,
            database_url: String::default(),
            auto_migrate: false,
            auth: AuthConfig::default(),
            admin_group: DEFAULT_ADMIN_GROUP.to_string(),
            stripe: StripeConfig::default(),
            paypal: None,
            webhooks: WebhookConfig::default(),
            mailer: MailerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = non_empty_env("CPG_HOST").unwrap_or_else(|| DEFAULT_CPG_HOST.into());
        let port = match parse_env::<u16>("CPG_PORT") {
            Some(Ok(p)) => p,
            Some(Err(s)) => {
                error!("🪛️ {s} is not a valid port for CPG_PORT. Using the default, {DEFAULT_CPG_PORT}, instead.");
                DEFAULT_CPG_PORT
            },
            None => DEFAULT_CPG_PORT,
        };
        let database_url = non_empty_env("CPG_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ CPG_DATABASE_URL is not set. The default database location will be used.");
            String::default()
        });
        let auto_migrate = parse_boolean_flag(env::var("CPG_AUTO_MIGRATE").ok(), false);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let admin_group = non_empty_env("CPG_ADMIN_GROUP").unwrap_or_else(|| DEFAULT_ADMIN_GROUP.into());
        let stripe = stripe_config_from_env();
        let paypal = paypal_config_from_env();
        let webhooks = WebhookConfig::from_env();
        let mailer = MailerConfig::from_env();
        Self { host, port, database_url, auto_migrate, auth, admin_group, stripe, paypal, webhooks, mailer }
    }
}

fn stripe_config_from_env() -> StripeConfig {
    let secret_key = non_empty_env("CPG_STRIPE_SECRET_KEY").unwrap_or_else(|| {
        error!("🪛️ CPG_STRIPE_SECRET_KEY is not set. Card payments will fail until it is.");
        String::default()
    });
    let config = StripeConfig::new(secret_key);
    match non_empty_env("CPG_STRIPE_API_BASE") {
        Some(base) => {
            info!("🪛️ Using {base} for the card gateway API");
            config.with_api_base(base)
        },
        None => config,
    }
}

fn paypal_config_from_env() -> Option<PaypalConfig> {
    let (client_id, secret) = match (non_empty_env("CPG_PAYPAL_CLIENT_ID"), non_empty_env("CPG_PAYPAL_SECRET")) {
        (Some(id), Some(secret)) => (id, secret),
        (None, None) => {
            info!("🪛️ PayPal credentials are not set. Wallet payments are disabled.");
            return None;
        },
        _ => {
            warn!("🪛️ Only one of CPG_PAYPAL_CLIENT_ID and CPG_PAYPAL_SECRET is set. Wallet payments are disabled.");
            return None;
        },
    };
    let environment = match parse_env::<PaypalEnvironment>("CPG_PAYPAL_ENV") {
        Some(Ok(env)) => env,
        Some(Err(s)) => {
            warn!("🪛️ {s} is not a valid value for CPG_PAYPAL_ENV. Using the sandbox environment.");
            PaypalEnvironment::Sandbox
        },
        None => PaypalEnvironment::Sandbox,
    };
    let config = PaypalConfig::new(client_id, secret, environment);
    Some(match non_empty_env("CPG_PAYPAL_API_BASE") {
        Some(base) => config.with_api_base(base),
        None => config,
    })
}

//-------------------------------------------------  WebhookConfig  ----------------------------------------------------
/// Targets for webhook records. Records are only written for the events that have a target.
#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    pub payment_url: Option<String>,
    pub refund_url: Option<String>,
}

impl WebhookConfig {
    pub fn from_env() -> Self {
        let payment_url = non_empty_env("CPG_PAYMENT_WEBHOOK_URL");
        let refund_url = non_empty_env("CPG_REFUND_WEBHOOK_URL");
        if payment_url.is_none() {
            info!("🪛️ CPG_PAYMENT_WEBHOOK_URL is not set. No payment webhook records will be created.");
        }
        if refund_url.is_none() {
            info!("🪛️ CPG_REFUND_WEBHOOK_URL is not set. No refund webhook records will be created.");
        }
        Self { payment_url, refund_url }
    }
}

//-------------------------------------------------  MailerConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct MailerConfig {
    /// The mail relay endpoint. Without one, mails are only logged.
    pub relay_url: Option<String>,
    pub api_key: Secret<String>,
    /// Where order-received notifications go
    pub admin_email: Option<String>,
    pub confirmation_subject: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            api_key: Secret::default(),
            admin_email: None,
            confirmation_subject: DEFAULT_CONFIRMATION_SUBJECT.to_string(),
        }
    }
}

impl MailerConfig {
    pub fn from_env() -> Self {
        let relay_url = non_empty_env("CPG_MAILER_URL");
        if relay_url.is_none() {
            info!("🪛️ CPG_MAILER_URL is not set. Order emails will be logged instead of sent.");
        }
        let api_key = Secret::new(non_empty_env("CPG_MAILER_API_KEY").unwrap_or_default());
        let admin_email = non_empty_env("CPG_MAILER_ADMIN_EMAIL");
        if admin_email.is_none() {
            warn!("🪛️ CPG_MAILER_ADMIN_EMAIL is not set. Nobody will be told about new paid orders.");
        }
        let confirmation_subject =
            non_empty_env("CPG_MAILER_CONFIRMATION_SUBJECT").unwrap_or_else(|| DEFAULT_CONFIRMATION_SUBJECT.into());
        Self { relay_url, api_key, admin_email, confirmation_subject }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to verify (and, in tests and tooling, sign) access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since every token will be invalidated when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the CPG_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("CPG_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [CPG_JWT_SECRET]")))?;
        if secret.trim().len() < 16 {
            return Err(ServerError::ConfigurationError(
                "CPG_JWT_SECRET must be at least 16 characters long".to_string(),
            ));
        }
        Ok(Self::new(secret))
    }
}
