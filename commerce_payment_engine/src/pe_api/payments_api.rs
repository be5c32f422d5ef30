use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::PaymentQueries,
    db_types::{Hook, Transaction},
    pe_api::{
        access_control::{AccessControl, Caller},
        errors::PaymentApiError,
        payment_objects::PaymentQueryFilter,
    },
};

/// Read-only access to payment history, with the access rules applied.
pub struct PaymentsApi<B> {
    db: B,
    access: AccessControl,
}

impl<B> Debug for PaymentsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentsApi")
    }
}

impl<B> PaymentsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, access: AccessControl::default() }
    }

    pub fn with_access_control(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }
}

impl<B> PaymentsApi<B>
where B: PaymentQueries
{
    /// Lists transactions matching `filter`, oldest first. Administrators only.
    pub async fn list_payments(
        &self,
        caller: Option<&Caller>,
        filter: PaymentQueryFilter,
    ) -> Result<Vec<Transaction>, PaymentApiError> {
        self.access.require_admin(caller)?;
        trace!("💻️ Searching payments with {filter:?}");
        self.db.search_transactions(filter).await.map_err(PaymentApiError::database)
    }

    /// Fetches a single transaction. Administrators only.
    pub async fn get_payment(&self, caller: Option<&Caller>, id: &str) -> Result<Transaction, PaymentApiError> {
        self.access.require_admin(caller)?;
        self.db
            .fetch_transaction(id)
            .await
            .map_err(PaymentApiError::database)?
            .ok_or_else(|| PaymentApiError::NotFound(format!("Transaction {id}")))
    }

    pub async fn payments_for_user(
        &self,
        caller: Option<&Caller>,
        user_id: &str,
    ) -> Result<Vec<Transaction>, PaymentApiError> {
        let caller = self.access.require_identity(caller)?;
        self.access.check_user_access(caller, user_id)?;
        let filter = PaymentQueryFilter::default().with_user_id(user_id);
        self.db.search_transactions(filter).await.map_err(PaymentApiError::database)
    }

    pub async fn payments_for_order(
        &self,
        caller: Option<&Caller>,
        order_id: i64,
    ) -> Result<Vec<Transaction>, PaymentApiError> {
        let caller = self.access.require_identity(caller)?;
        let order = self
            .db
            .fetch_order(order_id)
            .await
            .map_err(PaymentApiError::database)?
            .ok_or_else(|| PaymentApiError::NotFound(format!("Order {order_id}")))?;
        self.access.check_order_access(caller, &order)?;
        let filter = PaymentQueryFilter::default().with_order_id(order_id);
        self.db.search_transactions(filter).await.map_err(PaymentApiError::database)
    }

    /// Webhook records awaiting delivery by the external dispatcher. Administrators only.
    pub async fn webhook_records(
        &self,
        caller: Option<&Caller>,
        event_type: Option<&str>,
    ) -> Result<Vec<Hook>, PaymentApiError> {
        self.access.require_admin(caller)?;
        self.db.fetch_hooks(event_type).await.map_err(PaymentApiError::database)
    }
}
