use std::fmt::{Debug, Display};

use crate::{
    db_types::{Hook, Order, Transaction},
    pe_api::payment_objects::PaymentQueryFilter,
};

/// Read-only access to orders, transactions and webhook records.
#[allow(async_fn_in_trait)]
pub trait PaymentQueries: Clone {
    type Error: Display + Debug;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, Self::Error>;

    async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, Self::Error>;

    /// Returns the transactions matching the filter, oldest first.
    async fn search_transactions(&self, filter: PaymentQueryFilter) -> Result<Vec<Transaction>, Self::Error>;

    /// Returns webhook records, oldest first, optionally restricted to a single event type.
    async fn fetch_hooks(&self, event_type: Option<&str>) -> Result<Vec<Hook>, Self::Error>;
}
