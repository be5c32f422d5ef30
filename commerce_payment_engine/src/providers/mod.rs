//! Charge providers: the capability the payment workflows use to move money through an external gateway.
//!
//! A provider only knows how to charge and refund. Choosing *which* provider handles a request is the workflow's job
//! (see [`ChargeProviders`]), based on the credentials the customer supplied.
mod errors;
mod paypal;
mod stripe;

use std::{fmt::Debug, sync::Arc};

use cpg_common::MinorUnits;
pub use errors::ProviderError;
use futures_util::future::BoxFuture;
pub use paypal::{validate_wallet_payment, PaypalProvider};
pub use stripe::StripeProvider;

use crate::db_types::PaymentProcessor;

/// The data a gateway needs to take a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount: MinorUnits,
    pub currency: String,
    /// A one-time card token, or the id of a customer-approved wallet payment
    pub token: String,
    /// The wallet payer id. Card charges do not use it.
    pub secondary_token: Option<String>,
}

pub trait ChargeProvider: Send + Sync {
    fn processor(&self) -> PaymentProcessor;

    fn supports_refunds(&self) -> bool {
        true
    }

    /// Takes the payment and returns the gateway's reference for it.
    fn charge(&self, request: ChargeRequest) -> BoxFuture<'_, Result<String, ProviderError>>;

    /// Refunds part or all of an earlier charge and returns the gateway's reference for the refund.
    fn refund(&self, amount: MinorUnits, charge_reference: String) -> BoxFuture<'_, Result<String, ProviderError>>;
}

/// The set of configured providers. A card provider is always present; the wallet provider is optional.
#[derive(Clone)]
pub struct ChargeProviders {
    card: Arc<dyn ChargeProvider>,
    wallet: Option<Arc<dyn ChargeProvider>>,
}

impl Debug for ChargeProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wallet = self.wallet.as_ref().map(|w| w.processor().to_string()).unwrap_or_else(|| "none".into());
        write!(f, "ChargeProviders(card: {}, wallet: {wallet})", self.card.processor())
    }
}

impl ChargeProviders {
    pub fn new(card: Arc<dyn ChargeProvider>) -> Self {
        Self { card, wallet: None }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn ChargeProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn card(&self) -> &Arc<dyn ChargeProvider> {
        &self.card
    }

    pub fn wallet(&self) -> Option<&Arc<dyn ChargeProvider>> {
        self.wallet.as_ref()
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    /// The provider that settled a charge made through `processor`. Orders without a recorded processor predate
    /// wallet support and are treated as card payments.
    pub fn for_processor(&self, processor: Option<PaymentProcessor>) -> Option<&Arc<dyn ChargeProvider>> {
        match processor {
            Some(PaymentProcessor::Paypal) => self.wallet.as_ref(),
            Some(PaymentProcessor::Stripe) | None => Some(&self.card),
        }
    }
}
