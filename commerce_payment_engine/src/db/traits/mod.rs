//! Backend-agnostic persistence contracts.
//!
//! The payment workflows only ever talk to storage through these traits, so a Postgres (or in-memory) backend can be
//! dropped in by implementing them. [`crate::SqliteDatabase`] is the reference implementation.
mod order_management;
mod payment_ledger;
mod payment_queries;

pub use order_management::OrderManagement;
pub use payment_ledger::{LedgerTransaction, PaymentLedger};
pub use payment_queries::PaymentQueries;
