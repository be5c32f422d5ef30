use cpg_common::{MinorUnits, DEFAULT_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{PaymentProcessor, TransactionStatus, TransactionType},
    providers::ChargeRequest,
};

//--------------------------------------   ChargeCredentials   ---------------------------------------------------------
/// The customer-supplied means of payment. Exactly one kind is used per charge; card credentials win when both are
/// supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeCredentials {
    Card { token: String },
    Wallet { payment_id: String, payer_id: String },
}

impl ChargeCredentials {
    /// Builds credentials from optional request fields. Empty strings count as absent. Returns `None` if neither a card
    /// token nor a complete pair of wallet fields is present.
    pub fn from_fields(
        card_token: Option<String>,
        wallet_payment_id: Option<String>,
        wallet_payer_id: Option<String>,
    ) -> Option<Self> {
        let present = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        if let Some(token) = present(card_token) {
            return Some(Self::Card { token });
        }
        match (present(wallet_payment_id), present(wallet_payer_id)) {
            (Some(payment_id), Some(payer_id)) => Some(Self::Wallet { payment_id, payer_id }),
            _ => None,
        }
    }

    pub fn processor(&self) -> PaymentProcessor {
        match self {
            Self::Card { .. } => PaymentProcessor::Stripe,
            Self::Wallet { .. } => PaymentProcessor::Paypal,
        }
    }

    pub fn into_charge_request(self, amount: MinorUnits, currency: &str) -> ChargeRequest {
        let (token, secondary_token) = match self {
            Self::Card { token } => (token, None),
            Self::Wallet { payment_id, payer_id } => (payment_id, Some(payer_id)),
        };
        ChargeRequest { amount, currency: currency.to_string(), token, secondary_token }
    }
}

//--------------------------------------    PaymentRequest     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_id: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub card_token: Option<String>,
    pub wallet_payment_id: Option<String>,
    pub wallet_payer_id: Option<String>,
}

impl PaymentRequest {
    pub fn new<S: Into<String>>(order_id: i64, amount: MinorUnits, currency: S) -> Self {
        Self {
            order_id,
            amount,
            currency: currency.into(),
            card_token: None,
            wallet_payment_id: None,
            wallet_payer_id: None,
        }
    }

    pub fn with_card_token<S: Into<String>>(mut self, token: S) -> Self {
        self.card_token = Some(token.into());
        self
    }

    pub fn with_wallet_payment<S: Into<String>>(mut self, payment_id: S, payer_id: S) -> Self {
        self.wallet_payment_id = Some(payment_id.into());
        self.wallet_payer_id = Some(payer_id.into());
        self
    }

    pub fn credentials(&self) -> Option<ChargeCredentials> {
        ChargeCredentials::from_fields(
            self.card_token.clone(),
            self.wallet_payment_id.clone(),
            self.wallet_payer_id.clone(),
        )
    }
}

//--------------------------------------     RefundRequest     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub transaction_id: String,
    pub amount: MinorUnits,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl RefundRequest {
    pub fn new<S: Into<String>>(transaction_id: S, amount: MinorUnits, currency: S) -> Self {
        Self { transaction_id: transaction_id.into(), amount, currency: currency.into() }
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

//--------------------------------------  PaymentQueryFilter   ---------------------------------------------------------
/// Search criteria for transaction listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQueryFilter {
    pub user_id: Option<String>,
    pub order_id: Option<i64>,
    pub status: Option<TransactionStatus>,
    #[serde(rename = "type")]
    pub tx_type: Option<TransactionType>,
    pub currency: Option<String>,
    pub processor_id: Option<String>,
}

impl PaymentQueryFilter {
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tx_type(mut self, tx_type: TransactionType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_processor_id<S: Into<String>>(mut self, processor_id: S) -> Self {
        self.processor_id = Some(processor_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.order_id.is_none() &&
            self.status.is_none() &&
            self.tx_type.is_none() &&
            self.currency.is_none() &&
            self.processor_id.is_none()
    }
}
