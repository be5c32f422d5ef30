//! Data types shared by the ledger backends and the public API.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cpg_common::MinorUnits;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {field}: {value}")]
pub struct ConversionError {
    field: &'static str,
    value: String,
}

impl ConversionError {
    fn new(field: &'static str, value: &str) -> Self {
        Self { field, value: value.to_string() }
    }
}

//--------------------------------------     PaymentState      ---------------------------------------------------------
/// Payment state of an order. The only transition is `Pending` -> `Paid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    #[default]
    Pending,
    Paid,
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Pending => write!(f, "pending"),
            PaymentState::Paid => write!(f, "paid"),
        }
    }
}

//--------------------------------------   FulfillmentState    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentState {
    #[default]
    Pending,
    Shipped,
}

impl Display for FulfillmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentState::Pending => write!(f, "pending"),
            FulfillmentState::Shipped => write!(f, "shipped"),
        }
    }
}

//--------------------------------------   PaymentProcessor    ---------------------------------------------------------
/// The gateway that settled an order's charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProcessor {
    /// Card-network gateway
    Stripe,
    /// Wallet-redirect gateway
    Paypal,
}

impl Display for PaymentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentProcessor::Stripe => write!(f, "stripe"),
            PaymentProcessor::Paypal => write!(f, "paypal"),
        }
    }
}

impl FromStr for PaymentProcessor {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::Paypal),
            s => Err(ConversionError::new("payment processor", s)),
        }
    }
}

//--------------------------------------   TransactionType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Charge,
    Refund,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Charge => write!(f, "charge"),
            TransactionType::Refund => write!(f, "refund"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charge" => Ok(Self::Charge),
            "refund" => Ok(Self::Refund),
            s => Err(ConversionError::new("transaction type", s)),
        }
    }
}

//--------------------------------------  TransactionStatus    ---------------------------------------------------------
/// `Pending` is set when the record is created, just before the gateway is called. It moves to `Paid` or `Failed`
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Paid => write!(f, "paid"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError::new("transaction status", s)),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// The owning user. Empty for anonymous orders that have not been claimed yet.
    pub user_id: String,
    pub email: String,
    pub currency: String,
    pub subtotal: MinorUnits,
    pub shipping: MinorUnits,
    pub taxes: MinorUnits,
    pub total: MinorUnits,
    pub payment_state: PaymentState,
    pub fulfillment_state: FulfillmentState,
    pub payment_processor: Option<PaymentProcessor>,
    pub billing_address_id: Option<i64>,
    pub shipping_address_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Order {
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_empty()
    }

    pub fn is_paid(&self) -> bool {
        self.payment_state == PaymentState::Paid
    }

    pub fn is_shipped(&self) -> bool {
        self.fulfillment_state == FulfillmentState::Shipped
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub sku: String,
    pub title: String,
    pub price: MinorUnits,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub sku: String,
    pub title: String,
    pub price: MinorUnits,
    pub quantity: i64,
}

impl NewLineItem {
    pub fn new<S: Into<String>>(sku: S, title: S, price: MinorUnits, quantity: i64) -> Self {
        Self { sku: sku.into(), title: title.into(), price, quantity }
    }

    /// Price times quantity, or `None` if that overflows.
    pub fn line_total(&self) -> Option<MinorUnits> {
        self.price.checked_mul(self.quantity)
    }
}

impl From<&LineItem> for NewLineItem {
    fn from(item: &LineItem) -> Self {
        Self { sku: item.sku.clone(), title: item.title.clone(), price: item.price, quantity: item.quantity }
    }
}

/// Returns `(subtotal, total)`: the sum of the line items, and that sum plus shipping and taxes. `None` if any step
/// overflows.
pub fn order_total(
    items: &[NewLineItem],
    shipping: MinorUnits,
    taxes: MinorUnits,
) -> Option<(MinorUnits, MinorUnits)> {
    let line_totals = items.iter().map(NewLineItem::line_total).collect::<Option<Vec<_>>>()?;
    let subtotal = MinorUnits::checked_sum(line_totals)?;
    let total = subtotal.checked_add(shipping)?.checked_add(taxes)?;
    Some((subtotal, total))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub user_id: String,
    pub email: String,
    pub currency: String,
    #[serde(default)]
    pub shipping: MinorUnits,
    #[serde(default)]
    pub taxes: MinorUnits,
    pub billing_address_id: Option<i64>,
    pub shipping_address_id: Option<i64>,
    pub line_items: Vec<NewLineItem>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(user_id: S, email: S, currency: S) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            currency: currency.into(),
            shipping: MinorUnits::default(),
            taxes: MinorUnits::default(),
            billing_address_id: None,
            shipping_address_id: None,
            line_items: vec![],
        }
    }

    pub fn with_item(mut self, item: NewLineItem) -> Self {
        self.line_items.push(item);
        self
    }

    pub fn with_shipping(mut self, shipping: MinorUnits) -> Self {
        self.shipping = shipping;
        self
    }

    pub fn with_taxes(mut self, taxes: MinorUnits) -> Self {
        self.taxes = taxes;
        self
    }

    pub fn with_billing_address(mut self, id: i64) -> Self {
        self.billing_address_id = Some(id);
        self
    }

    pub fn with_shipping_address(mut self, id: i64) -> Self {
        self.shipping_address_id = Some(id);
        self
    }

    /// `(subtotal, total)` for this order, or `None` if the amounts overflow.
    pub fn totals(&self) -> Option<(MinorUnits, MinorUnits)> {
        order_total(&self.line_items, self.shipping, self.taxes)
    }
}

//--------------------------------------     OrderUpdate       ---------------------------------------------------------
/// A partial update to an order. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub email: Option<String>,
    pub currency: Option<String>,
    pub billing_address_id: Option<i64>,
    pub shipping_address_id: Option<i64>,
    pub shipping: Option<MinorUnits>,
    pub taxes: Option<MinorUnits>,
    pub fulfillment_state: Option<FulfillmentState>,
    pub line_items: Option<Vec<NewLineItem>>,
}

impl OrderUpdate {
    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_billing_address(mut self, id: i64) -> Self {
        self.billing_address_id = Some(id);
        self
    }

    pub fn with_shipping_address(mut self, id: i64) -> Self {
        self.shipping_address_id = Some(id);
        self
    }

    pub fn with_shipping(mut self, shipping: MinorUnits) -> Self {
        self.shipping = Some(shipping);
        self
    }

    pub fn with_taxes(mut self, taxes: MinorUnits) -> Self {
        self.taxes = Some(taxes);
        self
    }

    pub fn with_fulfillment_state(mut self, state: FulfillmentState) -> Self {
        self.fulfillment_state = Some(state);
        self
    }

    pub fn with_line_items(mut self, items: Vec<NewLineItem>) -> Self {
        self.line_items = Some(items);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// True if the update changes any of the fields that are frozen once an order is paid. Totals are frozen too, since
    /// the settled charge must keep matching them.
    pub fn touches_paid_fields(&self, order: &Order) -> bool {
        self.currency.as_ref().is_some_and(|c| c != &order.currency) ||
            self.billing_address_id.is_some_and(|id| Some(id) != order.billing_address_id) ||
            self.changes_totals()
    }

    /// True if the update changes the shipping address.
    pub fn touches_shipping_address(&self, order: &Order) -> bool {
        self.shipping_address_id.is_some_and(|id| Some(id) != order.shipping_address_id)
    }

    /// True if the order's totals need to be recomputed after applying this update.
    pub fn changes_totals(&self) -> bool {
        self.line_items.is_some() || self.shipping.is_some() || self.taxes.is_some()
    }
}

//--------------------------------------     Transaction       ---------------------------------------------------------
/// One attempt to move money against an order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub order_id: i64,
    pub user_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    /// The gateway's reference for this charge or refund.
    pub processor_id: Option<String>,
    pub failure_code: Option<String>,
    pub failure_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Paid
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub id: String,
    pub order_id: i64,
    pub user_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub tx_type: TransactionType,
}

impl NewTransaction {
    /// A pending charge against `order` on behalf of the order's owner.
    pub fn charge(order: &Order, amount: MinorUnits, currency: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id,
            user_id: order.user_id.clone(),
            amount,
            currency: currency.to_string(),
            tx_type: TransactionType::Charge,
        }
    }

    /// A pending refund of part (or all) of `charge`.
    pub fn refund(charge: &Transaction, amount: MinorUnits) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: charge.order_id,
            user_id: charge.user_id.clone(),
            amount,
            currency: charge.currency.clone(),
            tx_type: TransactionType::Refund,
        }
    }
}

/// How a gateway call resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Paid { processor_id: String },
    Failed { code: String, description: String },
}

impl Settlement {
    pub fn status(&self) -> TransactionStatus {
        match self {
            Settlement::Paid { .. } => TransactionStatus::Paid,
            Settlement::Failed { .. } => TransactionStatus::Failed,
        }
    }
}

//--------------------------------------        Hook           ---------------------------------------------------------
/// A webhook delivery request. Delivery itself is handled by an external dispatcher that polls this table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Hook {
    pub id: i64,
    pub event_type: String,
    pub url: String,
    pub user_id: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl Hook {
    pub fn payload_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHook {
    pub event_type: String,
    pub url: String,
    pub user_id: String,
    pub payload: serde_json::Value,
}

impl NewHook {
    pub fn new<S: Into<String>>(event_type: S, url: S, user_id: S, payload: serde_json::Value) -> Self {
        Self { event_type: event_type.into(), url: url.into(), user_id: user_id.into(), payload }
    }
}
