use cpg_common::MinorUnits;
use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewTransaction, Settlement, Transaction},
    pe_api::payment_objects::PaymentQueryFilter,
};

const TRANSACTION_COLUMNS: &str = "id, order_id, user_id, amount, currency, tx_type, status, processor_id, \
                                   failure_code, failure_description, created_at, updated_at";

/// Inserts a new transaction in the `pending` state.
pub async fn insert_transaction(
    tx: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, SqliteDatabaseError> {
    let query = format!(
        "INSERT INTO transactions (id, order_id, user_id, amount, currency, tx_type, status) VALUES ($1, $2, $3, $4, \
         $5, $6, 'pending') RETURNING {TRANSACTION_COLUMNS}"
    );
    let record = sqlx::query_as::<_, Transaction>(&query)
        .bind(tx.id)
        .bind(tx.order_id)
        .bind(tx.user_id)
        .bind(tx.amount)
        .bind(tx.currency)
        .bind(tx.tx_type)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Pending {} {} recorded for order #{}", record.tx_type, record.id, record.order_id);
    Ok(record)
}

pub async fn fetch_transaction(
    id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SqliteDatabaseError> {
    let query = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1");
    let tx = sqlx::query_as::<_, Transaction>(&query).bind(id).fetch_optional(conn).await?;
    Ok(tx)
}

/// Settles a pending transaction. Only `pending` rows are touched, so a transaction can never be settled twice.
pub async fn settle_transaction(
    id: &str,
    settlement: &Settlement,
    conn: &mut SqliteConnection,
) -> Result<Transaction, SqliteDatabaseError> {
    let (processor_id, failure_code, failure_description) = match settlement {
        Settlement::Paid { processor_id } => (Some(processor_id.as_str()), None, None),
        Settlement::Failed { code, description } => (None, Some(code.as_str()), Some(description.as_str())),
    };
    let query = format!(
        "UPDATE transactions SET status = $1, processor_id = $2, failure_code = $3, failure_description = $4, \
         updated_at = CURRENT_TIMESTAMP WHERE id = $5 AND status = 'pending' RETURNING {TRANSACTION_COLUMNS}"
    );
    let record = sqlx::query_as::<_, Transaction>(&query)
        .bind(settlement.status())
        .bind(processor_id)
        .bind(failure_code)
        .bind(failure_description)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| SqliteDatabaseError::TransactionAlreadySettled(id.to_string()))?;
    trace!("🗃️ Transaction {id} settled as {}", record.status);
    Ok(record)
}

/// Sum of the refunds against an order that are paid or still in flight.
pub async fn refunded_total(order_id: i64, conn: &mut SqliteConnection) -> Result<MinorUnits, SqliteDatabaseError> {
    let total: i64 = sqlx::query_scalar(
        r#"
            SELECT COALESCE(SUM(amount), 0) FROM transactions
            WHERE order_id = $1 AND tx_type = 'refund' AND status <> 'failed'
        "#,
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(MinorUnits::from(total))
}

/// Fetches transactions according to criteria specified in the `PaymentQueryFilter`
///
/// Resulting transactions are ordered by `created_at` in ascending order
pub async fn search_transactions(
    filter: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {TRANSACTION_COLUMNS} FROM transactions "));
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(order_id) = filter.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(tx_type) = filter.tx_type {
        where_clause.push("tx_type = ");
        where_clause.push_bind_unseparated(tx_type);
    }
    if let Some(currency) = filter.currency {
        where_clause.push("currency = ");
        where_clause.push_bind_unseparated(currency);
    }
    if let Some(processor_id) = filter.processor_id {
        where_clause.push("processor_id = ");
        where_clause.push_bind_unseparated(processor_id);
    }
    builder.push(" ORDER BY created_at ASC, rowid ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let transactions = builder.build_query_as::<Transaction>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_transactions: {}", transactions.len());
    Ok(transactions)
}
