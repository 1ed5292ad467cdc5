//! Unifies API for reading customers, orders and the catalog.
use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Coupon, Customer, LedgerEntry, LoyaltyPolicy, Order, OrderId, PosSaleRecord, Product},
    engine_api::order_objects::OrderQueryFilter,
    traits::{CustomerApiError, CustomerManagement},
};

pub struct CustomerApi<B> {
    db: B,
}

impl<B: Debug> Debug for CustomerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomerApi ({:?})", self.db)
    }
}

impl<B> CustomerApi<B>
where B: CustomerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the customer for the given id. If no customer exists, `None` is returned.
    pub async fn customer_by_id(&self, customer_id: &str) -> Result<Option<Customer>, CustomerApiError> {
        self.db.fetch_customer(customer_id).await
    }

    /// The customer's loyalty ledger, oldest entry first. The entries sum to the customer's current balance.
    pub async fn ledger_for_customer(&self, customer_id: &str) -> Result<Vec<LedgerEntry>, CustomerApiError> {
        let entries = self.db.fetch_ledger_for_customer(customer_id).await?;
        trace!("🎖️ {} ledger entries for customer {customer_id}", entries.len());
        Ok(entries)
    }

    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, CustomerApiError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    pub async fn product_by_id(&self, product_id: &str) -> Result<Option<Product>, CustomerApiError> {
        self.db.fetch_product(product_id).await
    }

    pub async fn pos_sale_by_id(&self, sale_id: &str) -> Result<Option<PosSaleRecord>, CustomerApiError> {
        self.db.fetch_pos_sale(sale_id).await
    }

    pub async fn loyalty_policy(&self) -> Result<Option<LoyaltyPolicy>, CustomerApiError> {
        self.db.fetch_loyalty_policy().await
    }

    pub async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, CustomerApiError> {
        self.db.fetch_coupon(code).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CustomerApiError> {
        trace!("🧾️ Searching orders. {query}");
        self.db.search_orders(query).await
    }
}
