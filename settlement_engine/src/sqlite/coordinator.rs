//! The transaction coordinator.
//!
//! Each function here is the body of one settlement transaction. It receives a connection that is already inside a
//! transaction, loads what it needs, runs the pure components from [`crate::settlement`] and writes the results back.
//! The caller commits on `Ok` and rolls back on `Err`.
//!
//! A body may run more than once if the store asks for a retry, so it must not do anything outside the store.
use log::*;
use rse_common::Money;
use sqlx::SqliteConnection;

use super::db::{coupons, customers, ledger, loyalty_policy, orders, pos_sales, products};
use crate::{
    config::{EngineConfig, PolicyMode},
    db_types::{
        Customer,
        LoyaltyPolicy,
        NewOrder,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        OrderType,
        PaymentStatus,
        PosSale,
    },
    engine_api::settlement_objects::{
        CancelOutcome,
        PaymentOutcome,
        PointsAdjustment,
        SettlementOutcome,
        SettlementSummary,
        StatusChange,
    },
    settlement::{
        guard::{self, GuardDecision},
        inventory::{self, StockDirection},
        loyalty_ledger,
        LoyaltySettlement,
    },
    traits::SettlementError,
};

pub async fn place_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SettlementError> {
    validate_items(&order.items)?;
    validate_amounts(&order.order_id.to_string(), order.total_price, order.points_redeemed)?;
    if orders::fetch_order_by_order_id(&order.order_id, &mut *conn).await?.is_some() {
        return Err(SettlementError::OrderAlreadyExists(order.order_id));
    }
    let mut reserved = false;
    if order.order_type == OrderType::Regular && !order.items.is_empty() {
        let outlet = order.outlet_id.as_deref().ok_or_else(|| {
            let message = format!("Order {} must name the outlet that holds its stock", order.order_id);
            SettlementError::InvalidRequest(message)
        })?;
        move_stock(&order.items, outlet, StockDirection::Out, conn).await?;
        reserved = true;
        debug!("📦️ Stock for order {} reserved at outlet {outlet}", order.order_id);
    }
    let order = orders::insert_order(order, reserved, conn).await?;
    Ok(order)
}

pub async fn record_payment(
    order_id: &OrderId,
    captured: bool,
    reference: &str,
    config: &EngineConfig,
    conn: &mut SqliteConnection,
) -> Result<PaymentOutcome, SettlementError> {
    let order = fetch_order(order_id, conn).await?;
    if order.status.is_terminal() {
        return Err(SettlementError::InvalidTransition {
            order_id: order.order_id,
            from: order.status,
            to: OrderStatusType::New,
        });
    }
    if order.is_paid() {
        if !captured {
            warn!("🧾️ Ignoring a failed capture ({reference}) for {order_id}, which is already paid");
        }
        return Ok(PaymentOutcome::AlreadyPaid { order });
    }
    if !captured {
        let order = orders::update_payment(order_id, order.status, PaymentStatus::Failed, reference, conn)
            .await?
            .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
        info!("🧾️ Payment {reference} for {order_id} failed");
        return Ok(PaymentOutcome::Failed { order });
    }
    let mut points_earned = 0;
    if let Some(customer_id) = &order.customer_id {
        let customer = fetch_customer(customer_id, conn).await?;
        let policy = resolve_policy(config.online_policy_mode, conn).await?;
        let plan = LoyaltySettlement::earn_only(&customer, order.total_price, &policy, &order.order_id.to_string());
        apply_loyalty(&customer, &plan, conn).await?;
        points_earned = plan.points_earned;
    }
    if order.order_type == OrderType::PreOrder && !order.stock_reserved {
        reserve_pre_order(&order, conn).await?;
    }
    let status = match order.status {
        OrderStatusType::PendingPayment => OrderStatusType::New,
        s => s,
    };
    let order = orders::update_payment(order_id, status, PaymentStatus::Paid, reference, conn)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
    info!("🧾️ Payment {reference} for {order_id} captured. {points_earned} points earned.");
    Ok(PaymentOutcome::Captured { order, points_earned })
}

pub async fn advance_order_status(
    order_id: &OrderId,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<StatusChange, SettlementError> {
    if guard::is_settlement_target(new_status) {
        return Err(SettlementError::InvalidRequest(format!(
            "Orders are moved to {new_status} by completing them, not by a status update"
        )));
    }
    if new_status == OrderStatusType::Canceled {
        return Err(SettlementError::InvalidRequest("Orders are canceled with a cancellation request".into()));
    }
    let order = fetch_order(order_id, conn).await?;
    let old_status = order.status;
    match guard::check_transition(old_status, new_status) {
        GuardDecision::AlreadySettled => Ok(StatusChange { old_status, order }),
        GuardDecision::Reject => {
            Err(SettlementError::InvalidTransition { order_id: order_id.clone(), from: old_status, to: new_status })
        },
        GuardDecision::Proceed => {
            let order = orders::update_status(order_id, new_status, order.payment_status, conn)
                .await?
                .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
            debug!("🧾️ Order {order_id} moved from {old_status} to {new_status}");
            Ok(StatusChange { old_status, order })
        },
    }
}

pub async fn complete_order(
    order_id: &OrderId,
    target: OrderStatusType,
    config: &EngineConfig,
    conn: &mut SqliteConnection,
) -> Result<SettlementOutcome, SettlementError> {
    if !guard::is_settlement_target(target) {
        return Err(SettlementError::InvalidTargetStatus(target));
    }
    let order = fetch_order(order_id, conn).await?;
    let reference = order.order_id.to_string();
    match guard::check_transition(order.status, target) {
        GuardDecision::AlreadySettled => {
            info!("🧾️ Order {reference} is already {}. Nothing to settle.", order.status);
            return Ok(SettlementOutcome::already_settled(reference));
        },
        GuardDecision::Reject => {
            return Err(SettlementError::InvalidTransition { order_id: order.order_id, from: order.status, to: target });
        },
        GuardDecision::Proceed => {},
    }
    let customer = match &order.customer_id {
        Some(id) => Some(fetch_customer(id, conn).await?),
        None => None,
    };
    let policy = resolve_policy(config.online_policy_mode, conn).await?;
    orders::update_status(order_id, target, PaymentStatus::Paid, conn)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
    let summary = match customer {
        Some(customer) => {
            let award_points = !order.is_paid();
            let plan = LoyaltySettlement::compute(
                &customer,
                order.total_price,
                order.points_redeemed,
                award_points,
                &policy,
                &reference,
            );
            apply_loyalty(&customer, &plan, conn).await?;
            plan.summary(&reference, target)
        },
        None => SettlementSummary::anonymous(&reference, target),
    };
    info!("🧾️ {}", summary.message);
    Ok(SettlementOutcome::Settled(summary))
}

pub async fn complete_pos_sale(
    sale: PosSale,
    config: &EngineConfig,
    conn: &mut SqliteConnection,
) -> Result<SettlementOutcome, SettlementError> {
    if sale.items.is_empty() {
        return Err(SettlementError::InvalidRequest(format!("POS sale {} has no items", sale.sale_id)));
    }
    validate_items(&sale.items)?;
    validate_amounts(&sale.sale_id, sale.total_price, sale.points_redeemed)?;
    let already_recorded = pos_sales::sale_exists(&sale.sale_id, &mut *conn).await?;
    if guard::check_pos_sale(already_recorded) == GuardDecision::AlreadySettled {
        info!("🧾️ POS sale {} has already been recorded. Nothing to settle.", sale.sale_id);
        return Ok(SettlementOutcome::already_settled(sale.sale_id));
    }
    let customer = match &sale.customer_id {
        Some(id) => Some(fetch_customer(id, conn).await?),
        None => None,
    };
    let policy = resolve_policy(config.pos_policy_mode, conn).await?;
    let record = pos_sales::insert_sale(&sale, conn).await?;
    let summary = match customer {
        Some(customer) => {
            let plan = LoyaltySettlement::compute(
                &customer,
                sale.total_price,
                sale.points_redeemed,
                true,
                &policy,
                &sale.sale_id,
            );
            apply_loyalty(&customer, &plan, conn).await?;
            plan.summary(&sale.sale_id, record.status)
        },
        None => SettlementSummary::anonymous(&sale.sale_id, record.status),
    };
    move_stock(&sale.items, &sale.outlet_id, StockDirection::Out, conn).await?;
    if let Some(code) = sale.promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
        if coupons::increment_usage(code, conn).await? {
            debug!("🧾️ Promo code {code} used on POS sale {}", sale.sale_id);
        } else {
            warn!(
                "🧾️ POS sale {} used promo code {code}, which is not registered. Usage is not counted.",
                sale.sale_id
            );
        }
    }
    info!("🧾️ {}", summary.message);
    Ok(SettlementOutcome::Settled(summary))
}

pub async fn cancel_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<CancelOutcome, SettlementError> {
    let order = orders::fetch_order_with_items(order_id, &mut *conn)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
    match guard::check_transition(order.status, OrderStatusType::Canceled) {
        GuardDecision::AlreadySettled => {
            info!("🧾️ Order {order_id} is already canceled");
            return Ok(CancelOutcome::AlreadyCanceled { reference: order_id.to_string() });
        },
        GuardDecision::Reject => {
            return Err(SettlementError::InvalidTransition {
                order_id: order.order_id,
                from: order.status,
                to: OrderStatusType::Canceled,
            });
        },
        GuardDecision::Proceed => {},
    }
    let mut restocked = false;
    if order.holds_stock_reservation() {
        match order.outlet_id.as_deref() {
            Some(outlet) => {
                move_stock(&order.items, outlet, StockDirection::In, conn).await?;
                orders::set_stock_reserved(order_id, false, conn).await?;
                restocked = true;
                debug!("📦️ Stock for order {order_id} returned to outlet {outlet}");
            },
            None => warn!("📦️ Order {order_id} has no outlet, so its stock cannot be returned"),
        }
    }
    let mut canceled = orders::update_status(order_id, OrderStatusType::Canceled, order.payment_status, conn)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
    canceled.items = order.items;
    info!("🧾️ Order {order_id} canceled");
    Ok(CancelOutcome::Canceled { order: canceled, restocked })
}

pub async fn adjust_points(
    customer_id: &str,
    delta: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<PointsAdjustment, SettlementError> {
    if reason.trim().is_empty() {
        return Err(SettlementError::InvalidRequest("A reason is required for a points adjustment".into()));
    }
    let customer = fetch_customer(customer_id, conn).await?;
    let entry = loyalty_ledger::adjust(&customer, delta, reason);
    let entry = ledger::insert_entry(entry, conn).await?;
    let customer = customers::update_loyalty(customer_id, delta, Money::from(0), customer.tier, conn)
        .await?
        .ok_or_else(|| SettlementError::CustomerNotFound(customer_id.to_string()))?;
    if customer.points_balance < 0 {
        warn!("🎖️ Adjustment leaves customer {customer_id} with a negative balance of {}", customer.points_balance);
    }
    info!("🎖️ Points for {customer_id} adjusted by {delta}: {reason}");
    Ok(PointsAdjustment { customer, entry })
}

/// Loads the loyalty policy, falling back to the built-in default if `mode` allows it.
pub async fn resolve_policy(mode: PolicyMode, conn: &mut SqliteConnection) -> Result<LoyaltyPolicy, SettlementError> {
    match loyalty_policy::fetch_policy(conn).await? {
        Some(policy) => Ok(policy),
        None => match mode {
            PolicyMode::Strict => Err(SettlementError::PolicyNotConfigured),
            PolicyMode::Lenient => {
                warn!("🎖️ No loyalty policy has been configured. Using the built-in default policy.");
                Ok(LoyaltyPolicy::default())
            },
        },
    }
}

async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Order, SettlementError> {
    orders::fetch_order_by_order_id(order_id, conn)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))
}

async fn fetch_customer(customer_id: &str, conn: &mut SqliteConnection) -> Result<Customer, SettlementError> {
    customers::fetch_customer(customer_id, conn)
        .await?
        .ok_or_else(|| SettlementError::CustomerNotFound(customer_id.to_string()))
}

/// Writes the ledger entries and the customer update computed by `plan`.
async fn apply_loyalty(
    customer: &Customer,
    plan: &LoyaltySettlement,
    conn: &mut SqliteConnection,
) -> Result<Customer, SettlementError> {
    ledger::insert_entries(plan.entries.clone(), &mut *conn).await?;
    let spend_delta = plan.new_lifetime_spend - customer.lifetime_spend;
    let updated = customers::update_loyalty(&customer.id, plan.net_points(), spend_delta, plan.new_tier, conn)
        .await?
        .ok_or_else(|| SettlementError::CustomerNotFound(customer.id.clone()))?;
    trace!(
        "🎖️ Customer {} now has {} points, {} lifetime spend and {} tier",
        updated.id,
        updated.points_balance,
        updated.lifetime_spend,
        updated.tier
    );
    Ok(updated)
}

/// Applies every line item to the outlet's stock and writes the touched products back.
///
/// All products are loaded and reconciled before anything is written, so an insufficient stock error on any item
/// leaves every product untouched.
async fn move_stock(
    items: &[OrderItem],
    outlet_id: &str,
    direction: StockDirection,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    let loaded = products::fetch_products(items.iter().map(|i| i.product_id.as_str()), &mut *conn).await?;
    let updated = inventory::reconcile_line_items(loaded, items, outlet_id, direction)?;
    for product in updated.values() {
        products::update_stock(product, &mut *conn).await?;
    }
    Ok(())
}

/// Takes a paid pre-order's line items out of its outlet's stock.
///
/// A pre-order is often placed before the stock exists, so a shortfall here leaves the order unreserved rather than
/// refusing the payment. Nothing is written in that case.
async fn reserve_pre_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    let Some(outlet) = order.outlet_id.as_deref() else {
        debug!("📦️ Pre-order {} has no outlet. No stock is reserved.", order.order_id);
        return Ok(());
    };
    let items = orders::fetch_items(&order.order_id, &mut *conn).await?;
    if items.is_empty() {
        return Ok(());
    }
    match move_stock(&items, outlet, StockDirection::Out, conn).await {
        Ok(()) => {
            orders::set_stock_reserved(&order.order_id, true, conn).await?;
            debug!("📦️ Stock for pre-order {} reserved at outlet {outlet}", order.order_id);
            Ok(())
        },
        Err(SettlementError::InsufficientStock { product, available, requested }) => {
            warn!(
                "📦️ Pre-order {} is paid, but outlet {outlet} has only {available} of the {requested} {product} it \
                 needs. No stock is reserved.",
                order.order_id
            );
            Ok(())
        },
        Err(e) => Err(e),
    }
}

fn validate_amounts(reference: &str, total_price: Money, points_redeemed: i64) -> Result<(), SettlementError> {
    if total_price.value() < 0 {
        return Err(SettlementError::InvalidRequest(format!("{reference} has a negative total of {total_price}")));
    }
    if points_redeemed < 0 {
        return Err(SettlementError::InvalidRequest(format!(
            "{reference} redeems a negative number of points ({points_redeemed})"
        )));
    }
    Ok(())
}

fn validate_items(items: &[OrderItem]) -> Result<(), SettlementError> {
    if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
        return Err(SettlementError::InvalidRequest(format!(
            "Line item {} has a quantity of {}. Quantities must be positive.",
            item.sku, item.quantity
        )));
    }
    if let Some(item) = items.iter().find(|i| i.unit_price.value() < 0) {
        return Err(SettlementError::InvalidRequest(format!("Line item {} has a negative price", item.sku)));
    }
    Ok(())
}
