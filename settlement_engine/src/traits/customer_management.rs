use thiserror::Error;

use crate::{
    db_types::{Coupon, Customer, LedgerEntry, LoyaltyPolicy, Order, OrderId, PosSaleRecord, Product},
    engine_api::order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for CustomerApiError {
    fn from(e: sqlx::Error) -> Self {
        CustomerApiError::DatabaseError(e.to_string())
    }
}

/// Read-only queries over the data the settlement engine maintains.
///
/// None of these methods mutate state, and a missing record is reported as `None` rather than an error.
#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, CustomerApiError>;

    /// The customer's full ledger, oldest entry first.
    async fn fetch_ledger_for_customer(&self, customer_id: &str) -> Result<Vec<LedgerEntry>, CustomerApiError>;

    /// Fetches the order along with its line items.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, CustomerApiError>;

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, CustomerApiError>;

    /// Fetches the POS sale record along with its line items.
    async fn fetch_pos_sale(&self, sale_id: &str) -> Result<Option<PosSaleRecord>, CustomerApiError>;

    async fn fetch_loyalty_policy(&self) -> Result<Option<LoyaltyPolicy>, CustomerApiError>;

    async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, CustomerApiError>;

    /// Orders matching every condition in `query`, oldest first. Line items are not loaded.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CustomerApiError>;
}
