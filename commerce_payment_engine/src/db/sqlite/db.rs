use std::fmt::Debug;

use cpg_common::MinorUnits;
use log::*;
use sqlx::{migrate, Sqlite, SqlitePool};

use super::{db_url, hooks, new_pool, orders, transactions, SqliteDatabaseError};
use crate::{
    db::traits::{LedgerTransaction, OrderManagement, PaymentLedger, PaymentQueries},
    db_types::{Hook, NewHook, NewOrder, NewTransaction, Order, OrderUpdate, PaymentProcessor, Settlement, Transaction},
    pe_api::payment_objects::PaymentQueryFilter,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database named in `CPG_DATABASE_URL`, or the default location if it is not set.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

//-------------------------------------------   PaymentLedger   --------------------------------------------------------
/// A single SQLite transaction over the ledger. Dropping it without calling `commit` rolls everything back.
pub struct SqliteLedgerTx {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl PaymentLedger for SqliteDatabase {
    type Error = SqliteDatabaseError;
    type Tx = SqliteLedgerTx;

    async fn begin(&self) -> Result<Self::Tx, Self::Error> {
        let tx = self.pool.begin().await?;
        Ok(SqliteLedgerTx { tx })
    }
}

impl LedgerTransaction for SqliteLedgerTx {
    type Error = SqliteDatabaseError;

    async fn fetch_order(&mut self, order_id: i64) -> Result<Option<Order>, Self::Error> {
        orders::fetch_order(order_id, &mut self.tx).await
    }

    async fn assign_order_owner(&mut self, order_id: i64, user_id: &str) -> Result<(), Self::Error> {
        orders::assign_owner(order_id, user_id, &mut self.tx).await
    }

    async fn mark_order_paid(&mut self, order_id: i64, processor: PaymentProcessor) -> Result<bool, Self::Error> {
        orders::mark_paid(order_id, processor, &mut self.tx).await
    }

    async fn fetch_transaction(&mut self, id: &str) -> Result<Option<Transaction>, Self::Error> {
        transactions::fetch_transaction(id, &mut self.tx).await
    }

    async fn refunded_total(&mut self, order_id: i64) -> Result<MinorUnits, Self::Error> {
        transactions::refunded_total(order_id, &mut self.tx).await
    }

    async fn insert_transaction(&mut self, tx: NewTransaction) -> Result<Transaction, Self::Error> {
        transactions::insert_transaction(tx, &mut self.tx).await
    }

    async fn settle_transaction(&mut self, id: &str, settlement: &Settlement) -> Result<Transaction, Self::Error> {
        transactions::settle_transaction(id, settlement, &mut self.tx).await
    }

    async fn insert_hook(&mut self, hook: NewHook) -> Result<i64, Self::Error> {
        hooks::insert_hook(hook, &mut self.tx).await
    }

    async fn commit(self) -> Result<(), Self::Error> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Self::Error> {
        self.tx.rollback().await?;
        Ok(())
    }
}

//-------------------------------------------   PaymentQueries   -------------------------------------------------------
impl PaymentQueries for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(id, &mut conn).await
    }

    async fn search_transactions(&self, filter: PaymentQueryFilter) -> Result<Vec<Transaction>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        transactions::search_transactions(filter, &mut conn).await
    }

    async fn fetch_hooks(&self, event_type: Option<&str>) -> Result<Vec<Hook>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        hooks::fetch_hooks(event_type, &mut conn).await
    }
}

//-------------------------------------------   OrderManagement   ------------------------------------------------------
impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_order(&self, order: NewOrder) -> Result<Order, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn update_order(&self, order_id: i64, update: OrderUpdate) -> Result<Option<Order>, Self::Error> {
        let mut tx = self.pool.begin().await?;
        trace!("🗃️ Order #{order_id} updating with new values: {update:?}");
        let order = orders::update_order(order_id, update, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Order #{order_id} has been updated.");
        Ok(order)
    }
}
