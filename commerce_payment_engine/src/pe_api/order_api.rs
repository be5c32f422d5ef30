use std::fmt::Debug;

use log::*;

use cpg_common::MinorUnits;

use crate::{
    db::traits::OrderManagement,
    db_types::{order_total, NewLineItem, NewOrder, Order, OrderUpdate},
    pe_api::{
        access_control::{AccessControl, Caller},
        errors::PaymentApiError,
    },
};

/// Order ledger access for the checkout flow and for administrators.
pub struct OrderApi<B> {
    db: B,
    access: AccessControl,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, access: AccessControl::default() }
    }

    pub fn with_access_control(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }
}

impl<B> OrderApi<B>
where B: OrderManagement
{
    /// Stores a new, unpaid order. Totals are computed from the line items, shipping and taxes.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, PaymentApiError> {
        validate_amounts(&order.line_items, order.shipping, order.taxes)?;
        let order = self.db.insert_order(order).await.map_err(PaymentApiError::database)?;
        debug!("💻️ Order {} created with a total of {} {}", order.id, order.total, order.currency);
        Ok(order)
    }

    pub async fn fetch_order(&self, caller: Option<&Caller>, order_id: i64) -> Result<Order, PaymentApiError> {
        let caller = self.access.require_identity(caller)?;
        let order = self.order_by_id(order_id).await?;
        self.access.check_order_access(caller, &order)?;
        Ok(order)
    }

    /// Applies a partial update to an order. Administrators only.
    ///
    /// Once an order is paid, its currency, billing address and line items (and therefore its totals) are frozen. Once
    /// it has shipped, its shipping address is frozen.
    pub async fn update_order(
        &self,
        caller: Option<&Caller>,
        order_id: i64,
        update: OrderUpdate,
    ) -> Result<Order, PaymentApiError> {
        self.access.require_admin(caller)?;
        let order = self.order_by_id(order_id).await?;
        if update.is_empty() {
            return Ok(order);
        }
        if order.is_paid() && update.touches_paid_fields(&order) {
            return Err(PaymentApiError::InvalidState(format!(
                "Order {order_id} has been paid. Its currency, billing address and line items can no longer change"
            )));
        }
        if order.is_shipped() && update.touches_shipping_address(&order) {
            return Err(PaymentApiError::InvalidState(format!(
                "Order {order_id} has shipped. Its shipping address can no longer change"
            )));
        }
        if update.changes_totals() {
            let items = match &update.line_items {
                Some(items) => items.clone(),
                None => order.line_items.iter().map(NewLineItem::from).collect(),
            };
            let shipping = update.shipping.unwrap_or(order.shipping);
            let taxes = update.taxes.unwrap_or(order.taxes);
            validate_amounts(&items, shipping, taxes)?;
        }
        let updated = self
            .db
            .update_order(order_id, update)
            .await
            .map_err(PaymentApiError::database)?
            .ok_or_else(|| PaymentApiError::NotFound(format!("Order {order_id}")))?;
        info!("💻️ Order {order_id} updated");
        Ok(updated)
    }

    async fn order_by_id(&self, order_id: i64) -> Result<Order, PaymentApiError> {
        self.db
            .fetch_order_by_id(order_id)
            .await
            .map_err(PaymentApiError::database)?
            .ok_or_else(|| PaymentApiError::NotFound(format!("Order {order_id}")))
    }
}

/// Checks the amounts that make up an order's totals.
///
/// An order needs at least one line item. Quantities must be positive. Prices, shipping and taxes may not be negative,
/// and the resulting total must be representable.
fn validate_amounts(items: &[NewLineItem], shipping: MinorUnits, taxes: MinorUnits) -> Result<(), PaymentApiError> {
    if items.is_empty() {
        return Err(PaymentApiError::InvalidRequest("An order needs at least one line item".to_string()));
    }
    if items.iter().any(|i| i.quantity <= 0 || i.price.is_negative()) {
        return Err(PaymentApiError::InvalidRequest(
            "Line item quantities must be positive and prices may not be negative".to_string(),
        ));
    }
    if shipping.is_negative() || taxes.is_negative() {
        return Err(PaymentApiError::InvalidRequest("Shipping and taxes may not be negative".to_string()));
    }
    if order_total(items, shipping, taxes).is_none() {
        return Err(PaymentApiError::InvalidRequest("The order total is too large".to_string()));
    }
    Ok(())
}
