//! Commerce Payment Engine
//!
//! The engine takes payment for orders through external card and wallet gateways, refunds those payments, and keeps
//! a durable ledger of every attempt. It knows nothing about HTTP; the server crate wraps it.
//!
//! The library is divided into these sections:
//! 1. The ledger ([`mod@db`] traits plus the SQLite backend). Every order, transaction and webhook record lives here.
//!    The data types are defined in [`db_types`] and are public.
//! 2. Charge providers ([`providers`]). One implementation per gateway, behind the [`ChargeProvider`] trait.
//! 3. The public API ([`mod@pe_api`]). The payment and refund workflows, the read APIs and the access rules.
//! 4. Events ([`events`]) and the [`notifications`] built on them. A successful charge publishes a
//!    [`events::PaymentCompletedEvent`], which the server uses to send order emails without holding up the request.
pub mod db;
pub mod db_types;
pub mod events;
pub mod notifications;
pub mod pe_api;
pub mod providers;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{LedgerTransaction, OrderManagement, PaymentLedger, PaymentQueries};
pub use pe_api::{
    access_control::{AccessControl, Caller},
    errors::PaymentApiError,
    order_api::OrderApi,
    payment_flow_api::{PaymentFlowApi, WebhookTargets},
    payment_objects::{ChargeCredentials, PaymentQueryFilter, PaymentRequest, RefundRequest},
    payments_api::PaymentsApi,
};
pub use providers::{ChargeProvider, ChargeProviders, PaypalProvider, ProviderError, StripeProvider};
