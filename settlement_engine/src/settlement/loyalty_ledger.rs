//! Point arithmetic for the loyalty ledger.
//!
//! Each earn and each redeem event produces its own ledger entry. Entries are never merged, so the balance can
//! always be reconstructed (or reversed) from the ledger alone.
use log::*;
use rse_common::Money;

use crate::db_types::{Customer, LedgerEntryType, LoyaltyPolicy, NewLedgerEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Earning {
    pub points: i64,
    /// `None` when no points were earned
    pub entry: Option<NewLedgerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub requested: i64,
    pub accepted: bool,
    /// `None` when nothing was requested, or the request was rejected
    pub entry: Option<NewLedgerEntry>,
}

impl Redemption {
    /// Points actually deducted from the balance.
    pub fn points(&self) -> i64 {
        if self.accepted {
            self.requested
        } else {
            0
        }
    }

    /// True if the customer asked to spend points but the balance could not cover them.
    pub fn skipped(&self) -> bool {
        self.requested > 0 && !self.accepted
    }
}

/// Points earned for spending `order_total`, at the earn rate of the customer's current tier.
pub fn earn(customer: &Customer, order_total: Money, policy: &LoyaltyPolicy, reference: &str) -> Earning {
    let rate = policy.points_per_100_for(customer.tier);
    let points = order_total.hundreds() * rate;
    trace!("🎖️ {} at {rate} pts/100 earns {points} points for customer {}", order_total, customer.id);
    let entry = (points > 0).then(|| NewLedgerEntry {
        customer_id: customer.id.clone(),
        delta: points,
        entry_type: LedgerEntryType::Earn,
        reason: format!("Points earned from order {reference}"),
    });
    Earning { points, entry }
}

/// Deducts `requested` points if, and only if, the current balance covers them.
///
/// A rejected redemption is not an error. The checkout flow is expected to have validated the balance already, so
/// the settlement continues without the deduction.
pub fn redeem(customer: &Customer, requested: i64, reference: &str) -> Redemption {
    if requested <= 0 {
        return Redemption { requested: 0, accepted: false, entry: None };
    }
    if customer.points_balance < requested {
        warn!(
            "🎖️ Customer {} wants to redeem {requested} points for {reference}, but only has {}. The redemption is \
             skipped.",
            customer.id, customer.points_balance
        );
        return Redemption { requested, accepted: false, entry: None };
    }
    let entry = NewLedgerEntry {
        customer_id: customer.id.clone(),
        delta: -requested,
        entry_type: LedgerEntryType::Redeem,
        reason: format!("Points redeemed on order {reference}"),
    };
    Redemption { requested, accepted: true, entry: Some(entry) }
}

/// A manual correction by an administrator. Always produces an entry, whatever the sign and resulting balance.
pub fn adjust(customer: &Customer, delta: i64, reason: &str) -> NewLedgerEntry {
    NewLedgerEntry {
        customer_id: customer.id.clone(),
        delta,
        entry_type: LedgerEntryType::Adjustment,
        reason: reason.to_string(),
    }
}
