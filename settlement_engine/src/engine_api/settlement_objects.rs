use std::fmt::Display;

use rse_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Customer, LedgerEntry, Order, OrderStatusType, Tier};

pub const ALREADY_PROCESSED_MESSAGE: &str = "Order already processed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    pub customer_id: String,
    pub old_tier: Tier,
    pub new_tier: Tier,
}

/// A command to notify a customer, to be executed only once the transaction that produced it has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub customer_id: String,
    pub title: String,
    pub body: String,
    /// A path relative to the storefront, e.g. `/account/loyalty`
    pub link: String,
}

impl Notification {
    pub fn tier_upgrade(change: &TierChange) -> Self {
        let tier = capitalize(&change.new_tier.to_string());
        Self {
            customer_id: change.customer_id.clone(),
            title: format!("Welcome to {tier}!"),
            body: format!(
                "Congratulations, your purchases have moved you up from {} to {tier}. Enjoy higher point rewards on \
                 every order.",
                capitalize(&change.old_tier.to_string())
            ),
            link: "/account/loyalty".to_string(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The result of a settlement that ran its side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    /// The order or sale id that was settled
    pub reference: String,
    pub message: String,
    pub status: OrderStatusType,
    pub customer_id: Option<String>,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub redemption_skipped: bool,
    /// The customer's balance after the settlement. `None` for anonymous sales.
    pub new_balance: Option<i64>,
    pub new_lifetime_spend: Option<Money>,
    pub tier_change: Option<TierChange>,
}

impl SettlementSummary {
    pub fn anonymous<S: Into<String>>(reference: S, status: OrderStatusType) -> Self {
        let reference = reference.into();
        Self {
            message: format!("{reference} settled as {status}"),
            reference,
            status,
            customer_id: None,
            points_earned: 0,
            points_redeemed: 0,
            redemption_skipped: false,
            new_balance: None,
            new_lifetime_spend: None,
            tier_change: None,
        }
    }

    pub fn tier_changed(&self) -> bool {
        self.tier_change.is_some()
    }

    /// The post-commit "tier up" notification, if this settlement promoted the customer.
    pub fn notification(&self) -> Option<Notification> {
        self.tier_change.as_ref().map(Notification::tier_upgrade)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    Settled(SettlementSummary),
    /// The order or sale had already been settled (or cancelled). Nothing was changed.
    AlreadySettled { reference: String },
}

impl SettlementOutcome {
    pub fn already_settled<S: Into<String>>(reference: S) -> Self {
        Self::AlreadySettled { reference: reference.into() }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::AlreadySettled { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Settled(summary) => summary.message.clone(),
            Self::AlreadySettled { .. } => ALREADY_PROCESSED_MESSAGE.to_string(),
        }
    }

    pub fn summary(&self) -> Option<&SettlementSummary> {
        match self {
            Self::Settled(summary) => Some(summary),
            Self::AlreadySettled { .. } => None,
        }
    }
}

impl Display for SettlementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settled(s) => write!(f, "{}", s.message),
            Self::AlreadySettled { reference } => write!(f, "{reference}: {ALREADY_PROCESSED_MESSAGE}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    Canceled { order: Order, restocked: bool },
    AlreadyCanceled { reference: String },
}

impl CancelOutcome {
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::AlreadyCanceled { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Canceled { order, restocked: true } => format!("Order {} canceled and restocked", order.order_id),
            Self::Canceled { order, restocked: false } => format!("Order {} canceled", order.order_id),
            Self::AlreadyCanceled { .. } => ALREADY_PROCESSED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// The payment was captured now. `points_earned` were awarded immediately.
    Captured { order: Order, points_earned: i64 },
    AlreadyPaid { order: Order },
    Failed { order: Order },
}

impl PaymentOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Captured { order, .. } | Self::AlreadyPaid { order } | Self::Failed { order } => order,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Captured { order, points_earned } => {
                format!("Payment for {} captured. {points_earned} points earned", order.order_id)
            },
            Self::AlreadyPaid { order } => format!("Order {} is already paid", order.order_id),
            Self::Failed { order } => format!("Payment for {} failed", order.order_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl StatusChange {
    pub fn is_no_op(&self) -> bool {
        self.old_status == self.order.status
    }

    pub fn message(&self) -> String {
        if self.is_no_op() {
            format!("Order {} is already {}", self.order.order_id, self.order.status)
        } else {
            format!("Order {} moved from {} to {}", self.order.order_id, self.old_status, self.order.status)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAdjustment {
    pub customer: Customer,
    pub entry: LedgerEntry,
}

impl PointsAdjustment {
    pub fn message(&self) -> String {
        format!(
            "Adjusted points for {} by {}. New balance is {}",
            self.customer.id, self.entry.delta, self.customer.points_balance
        )
    }
}
