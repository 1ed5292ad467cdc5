use rse_common::Money;

use crate::db_types::{LoyaltyPolicy, Tier};

/// Returns the tier a customer holds after reaching `cumulative_spend`.
///
/// Tiers are only ever promoted. A customer whose spend falls below a threshold (e.g. after the thresholds were
/// raised) keeps the tier they already have.
pub fn next_tier(cumulative_spend: Money, current: Tier, gold_threshold: Money, platinum_threshold: Money) -> Tier {
    if cumulative_spend >= platinum_threshold {
        return Tier::Platinum.max(current);
    }
    if cumulative_spend >= gold_threshold && current < Tier::Gold {
        return Tier::Gold;
    }
    current
}

pub fn next_tier_for_policy(cumulative_spend: Money, current: Tier, policy: &LoyaltyPolicy) -> Tier {
    next_tier(cumulative_spend, current, policy.gold_threshold, policy.platinum_threshold)
}
