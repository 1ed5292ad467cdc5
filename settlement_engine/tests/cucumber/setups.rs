use cucumber::given;
use settlement_engine::{
    db_types::{LoyaltyPolicy, Money, Product, Variant},
    sqlite_db::customers,
};

use crate::cucumber::{settlement_world::SettlementSystem, SettlementWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut SettlementWorld) {
    let system = SettlementSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a loyalty policy of {int} points per 100 IDR with gold at {int} IDR and platinum at {int} IDR")]
async fn loyalty_policy(world: &mut SettlementWorld, rate: i64, gold: i64, platinum: i64) {
    let policy = LoyaltyPolicy::flat(rate, Money::from(gold), Money::from(platinum));
    world.api().set_loyalty_policy(policy).await.expect("Error setting loyalty policy");
}

#[given(expr = "product '{word}' named {string} with variant '{word}' at {int} IDR")]
async fn product(world: &mut SettlementWorld, id: String, name: String, sku: String, price: i64) {
    let product = Product::new(id, "vendor-1", name).with_variant(Variant::new(sku, Money::from(price)));
    world.api().upsert_product(product).await.expect("Error saving product");
}

#[given(expr = "outlet '{word}' holds {int} units of '{word}' variant '{word}'")]
async fn outlet_stock(world: &mut SettlementWorld, outlet: String, quantity: i64, product_id: String, sku: String) {
    let mut product =
        world.reader().product_by_id(&product_id).await.expect("Error fetching product").expect("No such product");
    let variant = product.variants.iter_mut().find(|v| v.sku == sku).expect("No such variant");
    *variant = variant.clone().with_outlet_stock(outlet, quantity);
    product.stock += quantity;
    world.api().upsert_product(product).await.expect("Error saving product");
}

#[given(expr = "customer '{word}' has {int} points")]
async fn customer_points(world: &mut SettlementWorld, customer_id: String, points: i64) {
    world.api().fetch_or_create_customer(&customer_id).await.expect("Error creating customer");
    if points != 0 {
        world.api().adjust_points(&customer_id, points, "Opening balance").await.expect("Error adjusting points");
    }
}

#[given(expr = "customer '{word}' has spent {int} IDR before")]
async fn customer_spend(world: &mut SettlementWorld, customer_id: String, spend: i64) {
    let customer = world.api().fetch_or_create_customer(&customer_id).await.expect("Error creating customer");
    let mut conn = world.api().db().pool().acquire().await.expect("Error acquiring connection");
    customers::update_loyalty(&customer_id, 0, Money::from(spend), customer.tier, &mut conn)
        .await
        .expect("Error updating lifetime spend");
}

#[given(expr = "promo code '{word}' is registered")]
async fn promo_code(world: &mut SettlementWorld, code: String) {
    world.api().upsert_coupon(&code).await.expect("Error registering promo code");
}
