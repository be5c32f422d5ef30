use cpg_common::MinorUnits;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{order_total, LineItem, NewLineItem, NewOrder, Order, OrderUpdate, PaymentProcessor},
};

const ORDER_COLUMNS: &str = "id, user_id, email, currency, subtotal, shipping, taxes, total, payment_state, \
                             fulfillment_state, payment_processor, billing_address_id, shipping_address_id, \
                             created_at, updated_at";

/// Inserts a new order and its line items using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let (subtotal, total) =
        order.totals().ok_or_else(|| SqliteDatabaseError::AmountOverflow(format!("new order for {}", order.email)))?;
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO orders (
                user_id,
                email,
                currency,
                subtotal,
                shipping,
                taxes,
                total,
                billing_address_id,
                shipping_address_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id;
        "#,
    )
    .bind(&order.user_id)
    .bind(&order.email)
    .bind(&order.currency)
    .bind(subtotal)
    .bind(order.shipping)
    .bind(order.taxes)
    .bind(total)
    .bind(order.billing_address_id)
    .bind(order.shipping_address_id)
    .fetch_one(&mut *conn)
    .await?;
    insert_line_items(id, &order.line_items, conn).await?;
    debug!("🗃️ Order #{id} saved with {} line items and a total of {total}", order.line_items.len());
    fetch_order(id, conn).await?.ok_or(SqliteDatabaseError::OrderNotFound(id))
}

async fn insert_line_items(
    order_id: i64,
    items: &[NewLineItem],
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    for item in items {
        sqlx::query("INSERT INTO line_items (order_id, sku, title, price, quantity) VALUES ($1, $2, $3, $4, $5)")
            .bind(order_id)
            .bind(&item.sku)
            .bind(&item.title)
            .bind(item.price)
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn fetch_line_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, SqliteDatabaseError> {
    let items = sqlx::query_as::<_, LineItem>(
        "SELECT id, order_id, sku, title, price, quantity FROM line_items WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Fetches the order with the given id, along with its line items.
pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&query).bind(order_id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.line_items = fetch_line_items(order_id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Claims an anonymous order for `user_id`. Fails if the order already has an owner.
pub(crate) async fn assign_owner(
    order_id: i64,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result =
        sqlx::query("UPDATE orders SET user_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND user_id = ''")
            .bind(user_id)
            .bind(order_id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OrderAlreadyClaimed(order_id));
    }
    trace!("🗃️ Order #{order_id} claimed by user {user_id}");
    Ok(())
}

/// Moves the order to `paid`, but only if it is still `pending`. Returns whether a row was changed.
pub(crate) async fn mark_paid(
    order_id: i64,
    processor: PaymentProcessor,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET payment_state = 'paid', payment_processor = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_state = 'pending'
        "#,
    )
    .bind(processor)
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn update_order(
    id: i64,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let Some(existing) = fetch_order(id, conn).await? else {
        return Ok(None);
    };
    if update.is_empty() {
        debug!("🗃️ No fields to update for order {id}. Update request skipped.");
        return Ok(Some(existing));
    }
    let changes_totals = update.changes_totals();
    let OrderUpdate {
        email,
        currency,
        billing_address_id,
        shipping_address_id,
        shipping,
        taxes,
        fulfillment_state,
        line_items,
    } = update;
    if let Some(items) = &line_items {
        sqlx::query("DELETE FROM line_items WHERE order_id = $1").bind(id).execute(&mut *conn).await?;
        insert_line_items(id, items, conn).await?;
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP");
    if let Some(email) = email {
        builder.push(", email = ").push_bind(email);
    }
    if let Some(currency) = currency {
        builder.push(", currency = ").push_bind(currency);
    }
    if let Some(billing) = billing_address_id {
        builder.push(", billing_address_id = ").push_bind(billing);
    }
    if let Some(shipping_address) = shipping_address_id {
        builder.push(", shipping_address_id = ").push_bind(shipping_address);
    }
    if let Some(state) = fulfillment_state {
        builder.push(", fulfillment_state = ").push_bind(state);
    }
    if changes_totals {
        let items = match line_items {
            Some(items) => items,
            None => existing.line_items.iter().map(NewLineItem::from).collect(),
        };
        let shipping = shipping.unwrap_or(existing.shipping);
        let taxes = taxes.unwrap_or(existing.taxes);
        let (subtotal, total): (MinorUnits, MinorUnits) = order_total(&items, shipping, taxes)
            .ok_or_else(|| SqliteDatabaseError::AmountOverflow(format!("order #{id}")))?;
        builder.push(", shipping = ").push_bind(shipping);
        builder.push(", taxes = ").push_bind(taxes);
        builder.push(", subtotal = ").push_bind(subtotal);
        builder.push(", total = ").push_bind(total);
    }
    builder.push(" WHERE id = ").push_bind(id);
    trace!("🗃️ Executing query: {}", builder.sql());
    let res = builder.build().execute(&mut *conn).await?;
    trace!("🗃️ Result of update_order: {res:?}");
    fetch_order(id, conn).await
}
