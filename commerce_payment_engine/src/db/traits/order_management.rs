use std::fmt::{Debug, Display};

use crate::db_types::{NewOrder, Order, OrderUpdate};

#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    type Error: Display + Debug;

    /// Stores a new order and its line items. Totals are computed from the line items, shipping and taxes.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, Self::Error>;

    /// Fetches an order and its line items.
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, Self::Error>;

    /// Applies a partial update, recomputing totals when line items, shipping or taxes change. Returns `None` if the
    /// order does not exist.
    async fn update_order(&self, order_id: i64, update: OrderUpdate) -> Result<Option<Order>, Self::Error>;
}
