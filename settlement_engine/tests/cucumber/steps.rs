use std::str::FromStr;

use cucumber::{then, when};
use settlement_engine::{
    db_types::{Money, NewOrder, OrderId, OrderStatusType, PosSale, Tier},
    SettlementError,
};

use crate::cucumber::SettlementWorld;

#[when(expr = "customer '{word}' orders {int} x '{word}' variant '{word}' as order {word} from outlet '{word}'")]
async fn place_order(
    world: &mut SettlementWorld,
    customer_id: String,
    quantity: i64,
    product_id: String,
    sku: String,
    order_id: String,
    outlet: String,
) {
    let item = world.item(&product_id, &sku, quantity).await;
    let order = NewOrder::new(OrderId::from(order_id), Some(customer_id), vec![item]).with_outlet(outlet);
    world.api().place_order(order).await.expect("Error placing order");
}

#[when(expr = "customer '{word}' orders {int} x '{word}' variant '{word}' as order {word} from outlet '{word}' redeeming {int} points")]
#[allow(clippy::too_many_arguments)]
async fn place_order_with_redemption(
    world: &mut SettlementWorld,
    customer_id: String,
    quantity: i64,
    product_id: String,
    sku: String,
    order_id: String,
    outlet: String,
    points: i64,
) {
    let item = world.item(&product_id, &sku, quantity).await;
    let order = NewOrder::new(OrderId::from(order_id), Some(customer_id), vec![item])
        .with_outlet(outlet)
        .with_points_redeemed(points);
    world.api().place_order(order).await.expect("Error placing order");
}

#[when(expr = "order {word} is marked {word}")]
async fn complete_order(world: &mut SettlementWorld, order_id: String, status: String) {
    let status = OrderStatusType::from_str(&status).expect("Not a valid order status");
    let outcome = world.api().complete_order(&OrderId::from(order_id), status).await;
    world.last_outcome = Some(outcome);
}

#[when(expr = "order {word} is canceled")]
async fn cancel_order(world: &mut SettlementWorld, order_id: String) {
    world.api().cancel_order(&OrderId::from(order_id)).await.expect("Error cancelling order");
}

#[when(expr = "outlet '{word}' rings up sale {word} of {int} x '{word}' variant '{word}' for customer '{word}'")]
async fn pos_sale(
    world: &mut SettlementWorld,
    outlet: String,
    sale_id: String,
    quantity: i64,
    product_id: String,
    sku: String,
    customer_id: String,
) {
    let item = world.item(&product_id, &sku, quantity).await;
    let sale = PosSale::new(sale_id, outlet, vec![item]).with_customer(customer_id);
    let outcome = world.api().complete_pos_sale(sale).await;
    world.last_outcome = Some(outcome);
}

#[when(expr = "outlet '{word}' rings up sale {word} of {int} x '{word}' variant '{word}' with promo code '{word}'")]
async fn pos_sale_with_promo(
    world: &mut SettlementWorld,
    outlet: String,
    sale_id: String,
    quantity: i64,
    product_id: String,
    sku: String,
    code: String,
) {
    let item = world.item(&product_id, &sku, quantity).await;
    let sale = PosSale::new(sale_id, outlet, vec![item]).with_promo_code(code);
    let outcome = world.api().complete_pos_sale(sale).await;
    world.last_outcome = Some(outcome);
}

#[then(expr = "the settlement earned {int} points")]
async fn points_earned(world: &mut SettlementWorld, points: i64) {
    let outcome = world.last_outcome().as_ref().expect("The settlement failed");
    let summary = outcome.summary().expect("The settlement was a no-op");
    assert_eq!(summary.points_earned, points);
}

#[then("the redemption was skipped")]
async fn redemption_skipped(world: &mut SettlementWorld) {
    let outcome = world.last_outcome().as_ref().expect("The settlement failed");
    assert!(outcome.summary().expect("The settlement was a no-op").redemption_skipped);
}

#[then(expr = "the settlement promoted the customer to {word}")]
async fn promoted(world: &mut SettlementWorld, tier: String) {
    let tier = Tier::from_str(&tier).expect("Not a valid tier");
    let outcome = world.last_outcome().as_ref().expect("The settlement failed");
    let change = outcome.summary().and_then(|s| s.tier_change.clone()).expect("No tier change was reported");
    assert_eq!(change.new_tier, tier);
}

#[then(expr = "the response is {string}")]
async fn response_message(world: &mut SettlementWorld, message: String) {
    let outcome = world.last_outcome().as_ref().expect("The settlement failed");
    assert_eq!(outcome.message(), message);
}

#[then(expr = "the settlement fails because only {int} units are available")]
async fn insufficient_stock(world: &mut SettlementWorld, available: i64) {
    match world.last_outcome() {
        Err(SettlementError::InsufficientStock { available: a, .. }) => assert_eq!(*a, available),
        other => panic!("Expected an insufficient stock error. Got {other:?}"),
    }
}

#[then(expr = "customer '{word}' has a balance of {int} points")]
async fn balance(world: &mut SettlementWorld, customer_id: String, points: i64) {
    let customer = world.reader().customer_by_id(&customer_id).await.expect("Error fetching customer").unwrap();
    assert_eq!(customer.points_balance, points, "Points balance is incorrect");
}

#[then(expr = "customer '{word}' has a lifetime spend of {int} IDR")]
async fn lifetime_spend(world: &mut SettlementWorld, customer_id: String, spend: i64) {
    let customer = world.reader().customer_by_id(&customer_id).await.expect("Error fetching customer").unwrap();
    assert_eq!(customer.lifetime_spend, Money::from(spend), "Lifetime spend is incorrect");
}

#[then(expr = "customer '{word}' is a {word} member")]
async fn tier(world: &mut SettlementWorld, customer_id: String, tier_name: String) {
    let customer = world.reader().customer_by_id(&customer_id).await.expect("Error fetching customer").unwrap();
    assert_eq!(customer.tier, Tier::from_str(&tier_name).expect("Not a valid tier"));
}

#[then(expr = "customer '{word}' has {int} {word} ledger entries")]
async fn ledger_entries(world: &mut SettlementWorld, customer_id: String, count: usize, entry_type: String) {
    let ledger = world.reader().ledger_for_customer(&customer_id).await.expect("Error fetching ledger");
    let matching = ledger.iter().filter(|e| e.entry_type.to_string() == entry_type).count();
    assert_eq!(matching, count, "Ledger has the wrong number of {entry_type} entries");
    let sum = ledger.iter().map(|e| e.delta).sum::<i64>();
    let customer = world.reader().customer_by_id(&customer_id).await.expect("Error fetching customer").unwrap();
    assert_eq!(sum, customer.points_balance, "Ledger does not add up to the balance");
}

#[then(expr = "outlet '{word}' holds {int} units of '{word}' variant '{word}'")]
async fn stock_level(world: &mut SettlementWorld, outlet: String, quantity: i64, product_id: String, sku: String) {
    let product =
        world.reader().product_by_id(&product_id).await.expect("Error fetching product").expect("No such product");
    let variant = product.variant(&sku).expect("No such variant");
    assert_eq!(variant.outlet_stock(&outlet), quantity, "Outlet stock is incorrect");
    assert_eq!(variant.stock_drift(), 0, "Variant stock has drifted from the outlet stocks");
}

#[then(expr = "promo code '{word}' has been used {int} time(s)")]
async fn promo_usage(world: &mut SettlementWorld, code: String, count: i64) {
    let coupon = world.reader().coupon_by_code(&code).await.expect("Error fetching coupon").expect("No such coupon");
    assert_eq!(coupon.usage_count, count);
}
