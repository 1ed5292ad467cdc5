use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Customer, LedgerEntry, Order},
    engine_api::settlement_objects::{Notification, SettlementSummary, TierChange},
};

/// An event published after a settlement transaction has committed.
pub trait SettlementEvent: Send + Sync + 'static {
    /// A short name for the event, used in logs
    const KIND: &'static str;

    /// The order, sale or customer the event is about
    fn reference(&self) -> String;
}

/// An online order or POS sale was settled. Not emitted for no-op settlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub summary: SettlementSummary,
}

impl OrderSettledEvent {
    pub fn new(summary: SettlementSummary) -> Self {
        Self { summary }
    }
}

/// A settlement promoted a customer to a higher tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUpgradedEvent {
    pub change: TierChange,
    pub notification: Notification,
}

impl TierUpgradedEvent {
    pub fn new(change: TierChange) -> Self {
        let notification = Notification::tier_upgrade(&change);
        Self { change, notification }
    }

    pub fn customer_id(&self) -> &str {
        &self.notification.customer_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub restocked: bool,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, restocked: bool) -> Self {
        Self { order, restocked }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAdjustedEvent {
    pub customer: Customer,
    pub entry: LedgerEntry,
}

impl PointsAdjustedEvent {
    pub fn new(customer: Customer, entry: LedgerEntry) -> Self {
        Self { customer, entry }
    }
}

impl SettlementEvent for OrderSettledEvent {
    const KIND: &'static str = "OrderSettled";

    fn reference(&self) -> String {
        self.summary.reference.clone()
    }
}

impl SettlementEvent for TierUpgradedEvent {
    const KIND: &'static str = "TierUpgraded";

    fn reference(&self) -> String {
        self.customer_id().to_string()
    }
}

impl SettlementEvent for OrderCancelledEvent {
    const KIND: &'static str = "OrderCancelled";

    fn reference(&self) -> String {
        self.order.order_id.to_string()
    }
}

impl SettlementEvent for PointsAdjustedEvent {
    const KIND: &'static str = "PointsAdjusted";

    fn reference(&self) -> String {
        self.customer.id.clone()
    }
}
