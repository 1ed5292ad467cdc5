#![allow(dead_code)]
use log::*;
use settlement_engine::{
    db_types::{Customer, LoyaltyPolicy, Money, OrderItem, Product, Variant},
    events::EventProducers,
    test_utils::prepare_env::new_test_database,
    CustomerApi,
    CustomerManagement,
    EngineConfig,
    SettlementApi,
    SettlementDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const OUTLET: &str = "jkt-central";
pub const GOLD: i64 = 5_000;
pub const PLATINUM: i64 = 20_000;

pub struct TestSystem {
    pub api: SettlementApi<SqliteDatabase>,
    pub reader: CustomerApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new(config: EngineConfig) -> Self {
        Self::with_producers(config, EventProducers::default()).await
    }

    pub async fn with_producers(config: EngineConfig, producers: EventProducers) -> Self {
        let db = new_test_database(config).await;
        let reader = CustomerApi::new(db.clone());
        let api = SettlementApi::new(db, producers);
        Self { api, reader }
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api.db()
    }

    /// 5 points per 100, gold at 5000, platinum at 20000.
    pub async fn with_flat_policy(self) -> Self {
        self.api
            .set_loyalty_policy(LoyaltyPolicy::flat(5, Money::from(GOLD), Money::from(PLATINUM)))
            .await
            .expect("Error setting loyalty policy");
        self
    }

    pub async fn customer(&self, id: &str) -> Customer {
        self.api.fetch_or_create_customer(id).await.expect("Error creating customer")
    }

    pub async fn coupon(&self, code: &str) {
        self.api.upsert_coupon(code).await.expect("Error registering coupon");
    }

    /// A tee shirt with `stock` units of size M at [`OUTLET`], and a mug with `mugs` units there.
    pub async fn stock_shelves(&self, stock: i64, mugs: i64) {
        let tee = Product::new("tee", "vendor-1", "Logo Tee")
            .with_variant(Variant::new("tee-m", Money::from(500)).with_outlet_stock(OUTLET, stock))
            .with_variant(Variant::new("tee-l", Money::from(500)).with_outlet_stock("bdg-mall", 4));
        let mug = Product::new("mug", "vendor-2", "Enamel Mug")
            .with_variant(Variant::new("mug-std", Money::from(100)).with_outlet_stock(OUTLET, mugs));
        self.api.upsert_product(tee).await.expect("Error saving tee");
        self.api.upsert_product(mug).await.expect("Error saving mug");
    }

    pub async fn outlet_stock(&self, product: &str, sku: &str) -> i64 {
        let product = self.reader.product_by_id(product).await.expect("Error fetching product").expect("No product");
        product.variant(sku).expect("No such variant").outlet_stock(OUTLET)
    }

    /// How far the variant's total stock is from the sum of its outlet stocks.
    pub async fn stock_drift(&self, product: &str, sku: &str) -> i64 {
        let product = self.reader.product_by_id(product).await.expect("Error fetching product").expect("No product");
        product.variant(sku).expect("No such variant").stock_drift()
    }

    pub async fn fetch_customer(&self, id: &str) -> Customer {
        self.db().fetch_customer(id).await.expect("Error fetching customer").expect("Customer does not exist")
    }

    pub async fn tear_down(self) {
        let mut db = self.api.db().clone();
        let url = db.url().to_string();
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Failed to remove test database {url}: {e}");
        }
    }
}

pub fn tee(quantity: i64) -> OrderItem {
    OrderItem::new("tee", "tee-m", quantity, Money::from(500))
}

pub fn mug(quantity: i64) -> OrderItem {
    OrderItem::new("mug", "mug-std", quantity, Money::from(100))
}
