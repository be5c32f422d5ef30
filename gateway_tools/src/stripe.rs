use std::sync::Arc;

use cpg_common::MinorUnits;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Response,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{StripeCharge, StripeErrorBody, StripeRefund},
    GatewayApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.base_url())
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, String)]) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("🏦️ Stripe POST {url}");
        let response =
            self.client.post(url).form(form).send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        parse_response(response).await
    }

    /// Charges a one-time card token. The gateway expects the currency code in lower case.
    pub async fn create_charge(
        &self,
        amount: MinorUnits,
        currency: &str,
        source: &str,
    ) -> Result<StripeCharge, GatewayApiError> {
        debug!("🏦️ Creating Stripe charge for {amount} {currency}");
        let form = [
            ("amount", amount.value().to_string()),
            ("currency", currency.to_ascii_lowercase()),
            ("source", source.to_string()),
        ];
        let charge = self.post_form::<StripeCharge>("/charges", &form).await?;
        info!("🏦️ Stripe charge {} created. Status: {}", charge.id, charge.status);
        Ok(charge)
    }

    /// Refunds part or all of an earlier charge.
    pub async fn create_refund(&self, charge_id: &str, amount: MinorUnits) -> Result<StripeRefund, GatewayApiError> {
        debug!("🏦️ Refunding {amount} against Stripe charge {charge_id}");
        let form = [("charge", charge_id.to_string()), ("amount", amount.value().to_string())];
        let refund = self.post_form::<StripeRefund>("/refunds", &form).await?;
        info!("🏦️ Stripe refund {} created for charge {charge_id}", refund.id);
        Ok(refund)
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, GatewayApiError> {
    let status = response.status();
    if status.is_success() {
        trace!("🏦️ Stripe request successful. {status}");
        return response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()));
    }
    let body = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
    let (code, message) = match serde_json::from_str::<StripeErrorBody>(&body) {
        Ok(err) => (err.error.code, err.error.message),
        Err(_) => (None, body),
    };
    warn!("🏦️ Stripe rejected the request. {status}: {message}");
    Err(GatewayApiError::Rejected { status: status.as_u16(), code, message })
}
