use serde::{Deserialize, Serialize};

//--------------------------------------       Stripe        -----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCharge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub paid: bool,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeRefund {
    pub id: String,
    pub amount: i64,
    pub charge: Option<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StripeErrorDetail {
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

//--------------------------------------       PayPal        -----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaypalPayment {
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub transactions: Vec<PaypalTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaypalTransaction {
    pub amount: Option<PaypalAmount>,
    pub description: Option<String>,
}

/// PayPal reports amounts as decimal strings with two places, e.g. `"50.00"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaypalAmount {
    pub total: String,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PaypalTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PaypalErrorBody {
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
}
