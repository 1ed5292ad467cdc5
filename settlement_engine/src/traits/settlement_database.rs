use thiserror::Error;

use crate::{
    db_types::{Coupon, Customer, LoyaltyPolicy, NewOrder, Order, OrderId, OrderStatusType, PosSale, Product},
    engine_api::settlement_objects::{CancelOutcome, PaymentOutcome, PointsAdjustment, SettlementOutcome, StatusChange},
    settlement::InventoryError,
    traits::{CustomerApiError, CustomerManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the Order Settlement Engine.
///
/// Every method is one atomic transaction. If a method fails, nothing it did is visible afterwards.
///
/// Backends are expected to retry a transaction that failed only because of contention with a concurrent writer,
/// which is why the transaction bodies must be free of side effects outside the store.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + CustomerManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new online order with its line items.
    ///
    /// Regular orders reserve their stock at the order's outlet immediately. Pre-orders reserve nothing.
    /// Fails with [`SettlementError::OrderAlreadyExists`] if the order id is already known.
    async fn place_order(&self, order: NewOrder) -> Result<Order, SettlementError>;

    /// Records the outcome of a payment capture reported by the payment gateway.
    ///
    /// * A captured payment on an unpaid order marks it paid, moves `pending_payment` orders to `new`, and awards the
    ///   order's points right away, so that completing the order later does not award them again.
    /// * A captured payment on a paid order is a no-op.
    /// * A failed capture marks the payment as failed and changes nothing else.
    async fn record_payment(
        &self,
        order_id: &OrderId,
        captured: bool,
        reference: &str,
    ) -> Result<PaymentOutcome, SettlementError>;

    /// Moves an order one step along its lifecycle, without settling or cancelling it.
    ///
    /// Requesting the order's current status is a no-op.
    async fn advance_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<StatusChange, SettlementError>;

    /// Settles an online order as `delivered` or `fulfilled`.
    ///
    /// In one transaction:
    /// * the order's status and payment status are written,
    /// * requested points are redeemed if the balance allows it,
    /// * points are earned unless they were already earned when the payment was captured,
    /// * lifetime spend and tier are updated.
    ///
    /// Settling an order that is already delivered, fulfilled or cancelled returns
    /// [`SettlementOutcome::AlreadySettled`] and changes nothing.
    async fn complete_order(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
    ) -> Result<SettlementOutcome, SettlementError>;

    /// Settles a point-of-sale checkout. In addition to the loyalty steps of [`Self::complete_order`], the sale's
    /// stock is taken from its outlet and the promo code's usage counter is incremented.
    ///
    /// A sale id that was already recorded returns [`SettlementOutcome::AlreadySettled`].
    async fn complete_pos_sale(&self, sale: PosSale) -> Result<SettlementOutcome, SettlementError>;

    /// Cancels an order, returning its stock reservation to the outlet if it holds one.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, SettlementError>;

    /// Applies an administrative correction to a customer's point balance. The balance may go negative.
    async fn adjust_points(
        &self,
        customer_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<PointsAdjustment, SettlementError>;

    /// Creates or replaces a product and its variants.
    async fn upsert_product(&self, product: Product) -> Result<Product, SettlementError>;

    /// Fetches the customer, creating a silver-tier account with no points if they do not exist yet.
    async fn fetch_or_create_customer(&self, customer_id: &str) -> Result<Customer, SettlementError>;

    /// Replaces the process-wide loyalty policy.
    async fn set_loyalty_policy(&self, policy: LoyaltyPolicy) -> Result<LoyaltyPolicy, SettlementError>;

    /// Registers a promo code. Existing codes keep their usage count.
    async fn upsert_coupon(&self, code: &str) -> Result<Coupon, SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The transaction could not complete because of concurrent writes: {0}")]
    StoreContention(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested POS sale {0} does not exist")]
    SaleNotFound(String),
    #[error("The requested customer {0} does not exist")]
    CustomerNotFound(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(String),
    #[error("Product {product} has no variant with SKU {sku}")]
    VariantNotFound { product: String, sku: String },
    #[error("Insufficient stock for {product}. {available} available, but {requested} requested")]
    InsufficientStock { product: String, available: i64, requested: i64 },
    #[error("No loyalty policy has been configured")]
    PolicyNotConfigured,
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("{0} is not a settlement status. Orders are completed as delivered or fulfilled.")]
    InvalidTargetStatus(OrderStatusType),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
}

impl SettlementError {
    /// True if the transaction failed only because another writer held the store. Re-running it may succeed.
    pub fn is_contention(&self) -> bool {
        matches!(self, SettlementError::StoreContention(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SettlementError::OrderNotFound(_) |
                SettlementError::SaleNotFound(_) |
                SettlementError::CustomerNotFound(_) |
                SettlementError::ProductNotFound(_) |
                SettlementError::VariantNotFound { .. }
        )
    }
}

// SQLite result codes for SQLITE_BUSY, SQLITE_LOCKED and their extended forms
const CONTENTION_CODES: [&str; 5] = ["5", "6", "261", "262", "517"];

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        let contention = match &e {
            sqlx::Error::Database(db) => {
                db.code().as_deref().map(|c| CONTENTION_CODES.contains(&c)).unwrap_or(false) ||
                    db.message().contains("database is locked")
            },
            sqlx::Error::PoolTimedOut => true,
            _ => false,
        };
        if contention {
            SettlementError::StoreContention(e.to_string())
        } else {
            SettlementError::DatabaseError(e.to_string())
        }
    }
}

impl From<InventoryError> for SettlementError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::ProductNotFound(id) => SettlementError::ProductNotFound(id),
            InventoryError::VariantNotFound { product, sku } => SettlementError::VariantNotFound { product, sku },
            InventoryError::InsufficientStock { product, available, requested, .. } => {
                SettlementError::InsufficientStock { product, available, requested }
            },
        }
    }
}

impl From<CustomerApiError> for SettlementError {
    fn from(e: CustomerApiError) -> Self {
        match e {
            CustomerApiError::DatabaseError(s) => SettlementError::DatabaseError(s),
            CustomerApiError::QueryError(s) => SettlementError::InvalidRequest(s),
        }
    }
}

impl From<serde_json::Error> for SettlementError {
    fn from(e: serde_json::Error) -> Self {
        SettlementError::DatabaseError(format!("Could not (de)serialize stored data. {e}"))
    }
}
