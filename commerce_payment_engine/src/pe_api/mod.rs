//! # Commerce payment engine public API
//!
//! The API is modular, so clients can pick and choose the functionality they want.
//!
//! * [`payment_flow_api`] charges orders and refunds charges. It is the only part of the API that moves money.
//! * [`payments_api`] provides read access to payment history.
//! * [`order_api`] creates and maintains orders in the ledger.
//! * [`access_control`] holds the authorization rules every API applies to the calling identity.
//!
//! # API usage
//!
//! Every API instance is created by supplying a backend that implements the traits that API needs:
//!
//! ```rust,ignore
//! use commerce_payment_engine::{PaymentsApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/payments.db", 5).await?;
//! // SqliteDatabase implements PaymentQueries
//! let api = PaymentsApi::new(db);
//! let history = api.payments_for_user(Some(&caller), "alice").await?;
//! ```
pub mod access_control;
pub mod errors;
pub mod order_api;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod payments_api;
