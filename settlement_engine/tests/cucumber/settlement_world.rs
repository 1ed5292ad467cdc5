use cucumber::World;
use log::*;
use settlement_engine::{
    db_types::OrderItem,
    events::EventProducers,
    settlement_objects::SettlementOutcome,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    CustomerApi,
    EngineConfig,
    SettlementApi,
    SettlementError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct SettlementWorld {
    pub system: Option<SettlementSystem>,
    /// The result of the most recent settlement request
    pub last_outcome: Option<Result<SettlementOutcome, SettlementError>>,
}

#[derive(Debug)]
pub struct SettlementSystem {
    pub db_path: String,
    pub api: SettlementApi<SqliteDatabase>,
    pub reader: CustomerApi<SqliteDatabase>,
}

impl SettlementWorld {
    pub fn api(&self) -> &SettlementApi<SqliteDatabase> {
        &self.system.as_ref().expect("SettlementApi not initialised").api
    }

    pub fn reader(&self) -> &CustomerApi<SqliteDatabase> {
        &self.system.as_ref().expect("CustomerApi not initialised").reader
    }

    pub fn last_outcome(&self) -> &Result<SettlementOutcome, SettlementError> {
        self.last_outcome.as_ref().expect("No settlement has been requested yet")
    }

    /// A line item priced at the variant's catalog price.
    pub async fn item(&self, product_id: &str, sku: &str, quantity: i64) -> OrderItem {
        let product = self
            .reader()
            .product_by_id(product_id)
            .await
            .expect("Error fetching product")
            .unwrap_or_else(|| panic!("Product {product_id} does not exist"));
        let price = product.variant(sku).unwrap_or_else(|| panic!("{product_id} has no variant {sku}")).price;
        OrderItem::new(product_id, sku, quantity, price)
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5)
            .await
            .expect("Error creating connection to database")
            .with_config(EngineConfig::default());
        debug!("Created database: {url}");
        let reader = CustomerApi::new(db.clone());
        let api = SettlementApi::new(db, EventProducers::default());
        Self { db_path: url, api, reader }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
