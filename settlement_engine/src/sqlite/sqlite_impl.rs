//! `SqliteDatabase` is a concrete implementation of an Order Settlement Engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! SQLite serializes writers. When two settlements touch the same customer or product at the same time, one of them
//! fails with `SQLITE_BUSY` (or one of its variants). `SqliteDatabase` rolls that transaction back and runs it again
//! from the start, up to [`EngineConfig::max_transaction_attempts`] times. The re-run sees the winner's committed
//! writes, so e.g. the losing POS sale re-checks stock against the reduced count.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::{
    coordinator,
    db::{coupons, customers, db_url, ledger, loyalty_policy, new_pool, orders, pos_sales, products},
};
use crate::{
    config::EngineConfig,
    db_types::{
        Coupon,
        Customer,
        LedgerEntry,
        LoyaltyPolicy,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        PosSale,
        PosSaleRecord,
        Product,
    },
    engine_api::{
        order_objects::OrderQueryFilter,
        settlement_objects::{CancelOutcome, PaymentOutcome, PointsAdjustment, SettlementOutcome, StatusChange},
    },
    traits::{CustomerApiError, CustomerManagement, SettlementDatabase, SettlementError},
};

const RETRY_BASE_DELAY_MS: u64 = 10;

/// Runs `$body` inside a fresh transaction, committing on success. If the transaction fails because of store
/// contention, it is rolled back and `$body` runs again in a new transaction.
macro_rules! with_retries {
    ($self:ident, $label:expr, |$conn:ident| $body:expr) => {{
        let mut attempt = 1u32;
        loop {
            let result = async {
                let mut tx = $self.pool.begin().await?;
                let value = {
                    let $conn: &mut SqliteConnection = &mut tx;
                    $body.await?
                };
                tx.commit().await?;
                Ok::<_, SettlementError>(value)
            }
            .await;
            match result {
                Err(e) if e.is_contention() && attempt < $self.config.max_transaction_attempts => {
                    debug!("🗃️ {} lost a write conflict on attempt {attempt}. Retrying. {e}", $label);
                    tokio::time::sleep(retry_delay(attempt)).await;
                    attempt += 1;
                },
                Err(e) if e.is_contention() => {
                    warn!("🗃️ {} could not complete after {attempt} attempts. {e}", $label);
                    break Err(e);
                },
                other => break other,
            }
        }
    }};
}

fn retry_delay(attempt: u32) -> Duration {
    let jitter = rand::random::<u64>() % RETRY_BASE_DELAY_MS;
    Duration::from_millis(RETRY_BASE_DELAY_MS * u64::from(attempt) + jitter)
}

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    config: EngineConfig,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the `RSE_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, config: EngineConfig::default() })
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SettlementError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SettlementError::DatabaseError(format!("Migrations failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn place_order(&self, order: NewOrder) -> Result<Order, SettlementError> {
        with_retries!(self, "place_order", |conn| coordinator::place_order(order.clone(), conn))
    }

    async fn record_payment(
        &self,
        order_id: &OrderId,
        captured: bool,
        reference: &str,
    ) -> Result<PaymentOutcome, SettlementError> {
        with_retries!(self, "record_payment", |conn| coordinator::record_payment(
            order_id,
            captured,
            reference,
            &self.config,
            conn
        ))
    }

    async fn advance_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<StatusChange, SettlementError> {
        with_retries!(self, "advance_order_status", |conn| {
            coordinator::advance_order_status(order_id, new_status, conn)
        })
    }

    async fn complete_order(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
    ) -> Result<SettlementOutcome, SettlementError> {
        with_retries!(self, "complete_order", |conn| coordinator::complete_order(order_id, target, &self.config, conn))
    }

    async fn complete_pos_sale(&self, sale: PosSale) -> Result<SettlementOutcome, SettlementError> {
        with_retries!(self, "complete_pos_sale", |conn| {
            coordinator::complete_pos_sale(sale.clone(), &self.config, conn)
        })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, SettlementError> {
        with_retries!(self, "cancel_order", |conn| coordinator::cancel_order(order_id, conn))
    }

    async fn adjust_points(
        &self,
        customer_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<PointsAdjustment, SettlementError> {
        with_retries!(self, "adjust_points", |conn| coordinator::adjust_points(customer_id, delta, reason, conn))
    }

    async fn upsert_product(&self, product: Product) -> Result<Product, SettlementError> {
        with_retries!(self, "upsert_product", |conn| products::upsert_product(product.clone(), conn))
    }

    async fn fetch_or_create_customer(&self, customer_id: &str) -> Result<Customer, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_or_create_customer(customer_id, &mut conn).await?;
        Ok(customer)
    }

    async fn set_loyalty_policy(&self, policy: LoyaltyPolicy) -> Result<LoyaltyPolicy, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let policy = loyalty_policy::upsert_policy(policy, &mut conn).await?;
        info!(
            "🎖️ Loyalty policy updated. Gold at {}, platinum at {}",
            policy.gold_threshold, policy.platinum_threshold
        );
        Ok(policy)
    }

    async fn upsert_coupon(&self, code: &str) -> Result<Coupon, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let coupon = coupons::upsert_coupon(code, &mut conn).await?;
        Ok(coupon)
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(customer_id, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_ledger_for_customer(&self, customer_id: &str) -> Result<Vec<LedgerEntry>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let entries = ledger::fetch_ledger_for_customer(customer_id, &mut conn).await?;
        Ok(entries)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_with_items(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn).await.map_err(|e| CustomerApiError::DatabaseError(e.to_string()))
    }

    async fn fetch_pos_sale(&self, sale_id: &str) -> Result<Option<PosSaleRecord>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let sale = pos_sales::fetch_sale(sale_id, &mut conn).await?;
        Ok(sale)
    }

    async fn fetch_loyalty_policy(&self) -> Result<Option<LoyaltyPolicy>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let policy = loyalty_policy::fetch_policy(&mut conn).await?;
        Ok(policy)
    }

    async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let coupon = coupons::fetch_coupon(code, &mut conn).await?;
        Ok(coupon)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}
