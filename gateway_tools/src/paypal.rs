use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use cpg_common::Secret;
use log::*;
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use crate::{
    config::PaypalConfig,
    data_objects::{PaypalErrorBody, PaypalPayment, PaypalTokenResponse},
    GatewayApiError,
};

/// Tokens are refreshed this long before PayPal says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::seconds(60);

#[derive(Clone)]
struct AccessToken {
    token: Secret<String>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Utc::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Clone)]
pub struct PaypalApi {
    config: PaypalConfig,
    client: Arc<Client>,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl PaypalApi {
    pub fn new(config: PaypalConfig) -> Result<Self, GatewayApiError> {
        let client = Client::builder().build().map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(RwLock::new(None)) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    /// Returns a cached OAuth2 access token, fetching a new one with the client credentials grant when the cached one
    /// is missing or about to expire.
    async fn access_token(&self) -> Result<Secret<String>, GatewayApiError> {
        if let Some(token) = self.token.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.token.clone());
        }
        let mut cache = self.token.write().await;
        // Another task may have refreshed the token while we waited for the lock
        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.token.clone());
        }
        debug!("🏦️ Requesting a new PayPal access token");
        let response = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(self.config.secret.reveal()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayApiError::AuthenticationFailed(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayApiError::AuthenticationFailed(format!("{status}. {body}")));
        }
        let token = response.json::<PaypalTokenResponse>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))?;
        let fresh = AccessToken {
            token: Secret::new(token.access_token),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        };
        let result = fresh.token.clone();
        *cache = Some(fresh);
        Ok(result)
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let token = self.access_token().await?;
        let url = self.url(path);
        trace!("🏦️ PayPal {method} {url}");
        let mut req = self.client.request(method, url).bearer_auth(token.reveal());
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        parse_response(response).await
    }

    /// Fetches a payment that the customer has approved on the PayPal side, but which has not been executed yet.
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaypalPayment, GatewayApiError> {
        debug!("🏦️ Fetching PayPal payment {payment_id}");
        let path = format!("/v1/payments/payment/{payment_id}");
        self.rest_query::<PaypalPayment, ()>(Method::GET, &path, None).await
    }

    /// Executes (captures) an approved payment on behalf of the given payer.
    pub async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<PaypalPayment, GatewayApiError> {
        debug!("🏦️ Executing PayPal payment {payment_id}");
        let path = format!("/v1/payments/payment/{payment_id}/execute");
        let payment = self.rest_query(Method::POST, &path, Some(json!({ "payer_id": payer_id }))).await?;
        info!("🏦️ PayPal payment {payment_id} executed");
        Ok(payment)
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, GatewayApiError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()));
    }
    let body = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
    let (code, message) = match serde_json::from_str::<PaypalErrorBody>(&body) {
        Ok(err) => (err.name, err.message),
        Err(_) => (None, body),
    };
    warn!("🏦️ PayPal rejected the request. {status}: {message}");
    Err(GatewayApiError::Rejected { status: status.as_u16(), code, message })
}
