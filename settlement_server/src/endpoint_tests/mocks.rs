use mockall::mock;
use settlement_engine::{
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
    order_objects::OrderQueryFilter,
    settlement_objects::{CancelOutcome, PaymentOutcome, PointsAdjustment, SettlementOutcome, StatusChange},
    traits::{CustomerApiError, CustomerManagement, SettlementDatabase, SettlementError},
};

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl CustomerManagement for Backend {
        async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, CustomerApiError>;
        async fn fetch_ledger_for_customer(&self, customer_id: &str) -> Result<Vec<LedgerEntry>, CustomerApiError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, CustomerApiError>;
        async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, CustomerApiError>;
        async fn fetch_pos_sale(&self, sale_id: &str) -> Result<Option<PosSaleRecord>, CustomerApiError>;
        async fn fetch_loyalty_policy(&self) -> Result<Option<LoyaltyPolicy>, CustomerApiError>;
        async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, CustomerApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CustomerApiError>;
    }
    impl SettlementDatabase for Backend {
        fn url(&self) -> &str;
        async fn place_order(&self, order: NewOrder) -> Result<Order, SettlementError>;
        async fn record_payment(&self, order_id: &OrderId, captured: bool, reference: &str)
            -> Result<PaymentOutcome, SettlementError>;
        async fn advance_order_status(&self, order_id: &OrderId, new_status: OrderStatusType)
            -> Result<StatusChange, SettlementError>;
        async fn complete_order(&self, order_id: &OrderId, target: OrderStatusType)
            -> Result<SettlementOutcome, SettlementError>;
        async fn complete_pos_sale(&self, sale: PosSale) -> Result<SettlementOutcome, SettlementError>;
        async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, SettlementError>;
        async fn adjust_points(&self, customer_id: &str, delta: i64, reason: &str)
            -> Result<PointsAdjustment, SettlementError>;
        async fn upsert_product(&self, product: Product) -> Result<Product, SettlementError>;
        async fn fetch_or_create_customer(&self, customer_id: &str) -> Result<Customer, SettlementError>;
        async fn set_loyalty_policy(&self, policy: LoyaltyPolicy) -> Result<LoyaltyPolicy, SettlementError>;
        async fn upsert_coupon(&self, code: &str) -> Result<Coupon, SettlementError>;
    }
}
