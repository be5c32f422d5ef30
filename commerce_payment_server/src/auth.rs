//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs signed with the configured secret. A request without an `Authorization` header is
//! anonymous; a request with a header that fails validation is rejected outright rather than downgraded to
//! anonymous.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use commerce_payment_engine::Caller;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub groups: Vec<String>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new<S: Into<String>>(id: S, email: S, groups: Vec<String>, valid_for: Duration) -> Self {
        let exp = (Utc::now() + valid_for).timestamp();
        Self { id: id.into(), email: email.into(), groups, exp }
    }
}

impl From<JwtClaims> for Caller {
    fn from(claims: JwtClaims) -> Self {
        Caller { subject_id: claims.id, email: claims.email, groups: claims.groups }
    }
}

/// Signs access tokens. The server itself never issues tokens; this is for tooling and tests that share the secret
/// with the identity provider.
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, validation: Validation::new(Algorithm::HS256) }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.key, &self.validation).map(|data| data.claims).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidSignature => AuthError::ValidationError(e.to_string()),
            _ => AuthError::PoorlyFormattedToken(e.to_string()),
        })
    }

    /// Reads the caller from the `Authorization` header. `Ok(None)` means the request carried no credentials.
    pub fn caller_from_request(&self, req: &HttpRequest) -> Result<Option<Caller>, AuthError> {
        let header = match req.headers().get(AUTHORIZATION) {
            Some(h) => h,
            None => return Ok(None),
        };
        let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a bearer token".to_string()))?;
        let claims = self.validate(token)?;
        trace!("🔐️ Access token validated for {}", claims.id);
        Ok(Some(claims.into()))
    }
}

/// The (possibly absent) verified identity behind a request.
#[derive(Debug, Clone)]
pub struct Identity(pub Option<Caller>);

impl Identity {
    pub fn caller(&self) -> Option<&Caller> {
        self.0.as_ref()
    }
}

impl FromRequest for Identity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<TokenValidator>>() {
            Some(validator) => validator.caller_from_request(req).map(Identity).map_err(|e| {
                debug!("🔐️ Rejecting request to {}. {e}", req.path());
                ServerError::from(e)
            }),
            None => {
                error!("🔐️ No token validator has been registered with the application");
                Err(ServerError::InitializeError("Token validator is not configured".to_string()))
            },
        };
        ready(result)
    }
}
