use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Order not found: {0}")]
    OrderNotFound(i64),
    #[error("Order totals cannot be represented: {0}")]
    AmountOverflow(String),
    #[error("Order #{0} already has an owner")]
    OrderAlreadyClaimed(i64),
    #[error("Transaction {0} has already been settled")]
    TransactionAlreadySettled(String),
}
