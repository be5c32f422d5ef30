use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Transaction};

/// Published after a successful charge has been committed. `order` reflects the committed (paid) state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCompletedEvent {
    pub order: Order,
    pub transaction: Transaction,
}

impl PaymentCompletedEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }
}

/// Published after a successful refund has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundIssuedEvent {
    pub transaction: Transaction,
}

impl RefundIssuedEvent {
    pub fn new(transaction: Transaction) -> Self {
        Self { transaction }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    PaymentCompleted(PaymentCompletedEvent),
    RefundIssued(RefundIssuedEvent),
}
