use std::fmt::{Debug, Display};

use cpg_common::MinorUnits;

use crate::db_types::{NewHook, NewTransaction, Order, PaymentProcessor, Settlement, Transaction};

/// A backend that can open atomic units of work over the order/transaction ledger.
///
/// Everything written through a [`LedgerTransaction`] becomes visible together on [`LedgerTransaction::commit`], or not
/// at all. Dropping a transaction without committing it discards its writes.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger: Clone {
    type Error: Display + Debug;
    type Tx: LedgerTransaction<Error = Self::Error>;

    async fn begin(&self) -> Result<Self::Tx, Self::Error>;
}

/// The operations the payment and refund workflows perform inside a single persistence transaction.
#[allow(async_fn_in_trait)]
pub trait LedgerTransaction {
    type Error: Display + Debug;

    /// Fetches the order, including its line items.
    async fn fetch_order(&mut self, order_id: i64) -> Result<Option<Order>, Self::Error>;

    /// Assigns an owner to an order that does not have one yet.
    async fn assign_order_owner(&mut self, order_id: i64, user_id: &str) -> Result<(), Self::Error>;

    /// Moves the order from `pending` to `paid` and records the processor that took the money.
    ///
    /// The update is conditional on the order still being `pending`. Returns `false` if no row changed, i.e. another
    /// charge already marked the order as paid.
    async fn mark_order_paid(&mut self, order_id: i64, processor: PaymentProcessor) -> Result<bool, Self::Error>;

    async fn fetch_transaction(&mut self, id: &str) -> Result<Option<Transaction>, Self::Error>;

    /// The sum of all refunds recorded against the order that have not failed (i.e. paid or still pending).
    async fn refunded_total(&mut self, order_id: i64) -> Result<MinorUnits, Self::Error>;

    /// Records a new transaction in the `pending` state.
    async fn insert_transaction(&mut self, tx: NewTransaction) -> Result<Transaction, Self::Error>;

    /// Settles a pending transaction as paid or failed and returns the updated record.
    async fn settle_transaction(&mut self, id: &str, settlement: &Settlement) -> Result<Transaction, Self::Error>;

    async fn insert_hook(&mut self, hook: NewHook) -> Result<i64, Self::Error>;

    async fn commit(self) -> Result<(), Self::Error>;

    async fn rollback(self) -> Result<(), Self::Error>;
}
