use commerce_payment_engine::{
    db_types::{NewLineItem, NewOrder},
    Caller,
    PaymentRequest,
    RefundRequest,
};
use cpg_common::{MinorUnits, DEFAULT_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

/// Body of `POST /orders/{order_id}/payments`. Exactly one set of credentials is expected: a card token, or a wallet
/// payment id with its payer id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentParams {
    pub amount: MinorUnits,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stripe_token: Option<String>,
    #[serde(default)]
    pub paypal_payment_id: Option<String>,
    #[serde(default)]
    pub paypal_user_id: Option<String>,
}

impl CreatePaymentParams {
    pub fn into_payment_request(self, order_id: i64) -> PaymentRequest {
        PaymentRequest {
            order_id,
            amount: self.amount,
            currency: self.currency,
            card_token: self.stripe_token,
            wallet_payment_id: self.paypal_payment_id,
            wallet_payer_id: self.paypal_user_id,
        }
    }
}

/// Body of `POST /payments/{pay_id}/refund`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundParams {
    pub amount: MinorUnits,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl RefundParams {
    pub fn into_refund_request(self, transaction_id: String) -> RefundRequest {
        RefundRequest::new(transaction_id, self.amount, self.currency)
    }
}

/// Body of `POST /orders`. The owner is taken from the access token, never from the body. Anonymous checkouts must
/// supply an email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderParams {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub shipping: MinorUnits,
    #[serde(default)]
    pub taxes: MinorUnits,
    #[serde(default)]
    pub billing_address_id: Option<i64>,
    #[serde(default)]
    pub shipping_address_id: Option<i64>,
    pub line_items: Vec<NewLineItem>,
}

impl CreateOrderParams {
    pub fn into_new_order(self, caller: Option<&Caller>) -> Result<NewOrder, ServerError> {
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .or_else(|| caller.map(|c| c.email.clone()).filter(|e| !e.is_empty()))
            .ok_or_else(|| ServerError::InvalidRequestBody("An email address is required".to_string()))?;
        let user_id = caller.map(|c| c.subject_id.clone()).unwrap_or_default();
        Ok(NewOrder {
            user_id,
            email,
            currency: self.currency,
            shipping: self.shipping,
            taxes: self.taxes,
            billing_address_id: self.billing_address_id,
            shipping_address_id: self.shipping_address_id,
            line_items: self.line_items,
        })
    }
}
