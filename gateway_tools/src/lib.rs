//! Thin REST clients for the external payment gateways.
//!
//! * [`StripeApi`] talks to a card-network gateway (one-time card tokens, charges and refunds).
//! * [`PaypalApi`] talks to a wallet-redirect gateway (customer-approved payments that must be executed by the
//!   merchant).
//!
//! Neither client knows anything about orders. Credentials are passed in explicitly through [`StripeConfig`] and
//! [`PaypalConfig`].
mod config;
mod data_objects;
mod error;
mod paypal;
mod stripe;

pub use config::{PaypalConfig, PaypalEnvironment, StripeConfig};
pub use data_objects::{PaypalAmount, PaypalPayment, PaypalTransaction, StripeCharge, StripeRefund};
pub use error::GatewayApiError;
pub use paypal::PaypalApi;
pub use stripe::StripeApi;
