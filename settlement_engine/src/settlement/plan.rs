use rse_common::Money;

use super::{loyalty_ledger, tier_policy};
use crate::{
    db_types::{Customer, LoyaltyPolicy, NewLedgerEntry, OrderStatusType, Tier},
    engine_api::settlement_objects::{SettlementSummary, TierChange},
};

/// The loyalty side of a single settlement, computed from the customer as loaded inside the settlement transaction.
///
/// The calculation runs in this order:
/// 1. the redemption is checked against the balance *before* anything from this order is earned,
/// 2. points are earned at the rate of the customer's tier *before* any promotion from this order,
/// 3. lifetime spend grows by the full order total, even when nothing is earned,
/// 4. the tier is derived from the new lifetime spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltySettlement {
    pub customer_id: String,
    /// Ledger entries to append, earn before redeem
    pub entries: Vec<NewLedgerEntry>,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub redemption_skipped: bool,
    pub new_balance: i64,
    pub new_lifetime_spend: Money,
    pub old_tier: Tier,
    pub new_tier: Tier,
}

impl LoyaltySettlement {
    /// `award_points` is false when the points for this order were already awarded at payment time.
    pub fn compute(
        customer: &Customer,
        order_total: Money,
        points_requested: i64,
        award_points: bool,
        policy: &LoyaltyPolicy,
        reference: &str,
    ) -> Self {
        let redemption = loyalty_ledger::redeem(customer, points_requested, reference);
        let mut entries = Vec::with_capacity(2);
        let mut points_earned = 0;
        if award_points {
            let earning = loyalty_ledger::earn(customer, order_total, policy, reference);
            points_earned = earning.points;
            entries.extend(earning.entry);
        }
        let points_redeemed = redemption.points();
        let redemption_skipped = redemption.skipped();
        entries.extend(redemption.entry);
        let new_lifetime_spend = customer.lifetime_spend + order_total;
        let new_tier = tier_policy::next_tier_for_policy(new_lifetime_spend, customer.tier, policy);
        Self {
            customer_id: customer.id.clone(),
            entries,
            points_earned,
            points_redeemed,
            redemption_skipped,
            new_balance: customer.points_balance + points_earned - points_redeemed,
            new_lifetime_spend,
            old_tier: customer.tier,
            new_tier,
        }
    }

    /// Only the points leg of a settlement, used when a payment is captured before the order is completed.
    pub fn earn_only(customer: &Customer, order_total: Money, policy: &LoyaltyPolicy, reference: &str) -> Self {
        let earning = loyalty_ledger::earn(customer, order_total, policy, reference);
        Self {
            customer_id: customer.id.clone(),
            entries: earning.entry.into_iter().collect(),
            points_earned: earning.points,
            points_redeemed: 0,
            redemption_skipped: false,
            new_balance: customer.points_balance + earning.points,
            new_lifetime_spend: customer.lifetime_spend,
            old_tier: customer.tier,
            new_tier: customer.tier,
        }
    }

    pub fn net_points(&self) -> i64 {
        self.points_earned - self.points_redeemed
    }

    pub fn tier_change(&self) -> Option<TierChange> {
        (self.new_tier != self.old_tier).then(|| TierChange {
            customer_id: self.customer_id.clone(),
            old_tier: self.old_tier,
            new_tier: self.new_tier,
        })
    }

    /// Summarises the settlement of `reference` for the caller.
    pub fn summary(&self, reference: &str, status: OrderStatusType) -> SettlementSummary {
        let mut message = format!(
            "{reference} settled as {status}. {} points earned, {} points redeemed.",
            self.points_earned, self.points_redeemed
        );
        if self.redemption_skipped {
            message.push_str(" The requested redemption was skipped because the balance was too low.");
        }
        if self.tier_changed() {
            message.push_str(&format!(" Customer promoted to {}.", self.new_tier));
        }
        SettlementSummary {
            reference: reference.to_string(),
            message,
            status,
            customer_id: Some(self.customer_id.clone()),
            points_earned: self.points_earned,
            points_redeemed: self.points_redeemed,
            redemption_skipped: self.redemption_skipped,
            new_balance: Some(self.new_balance),
            new_lifetime_spend: Some(self.new_lifetime_spend),
            tier_change: self.tier_change(),
        }
    }

    pub fn tier_changed(&self) -> bool {
        self.new_tier != self.old_tier
    }
}
