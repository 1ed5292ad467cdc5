use crate::db_types::OrderStatusType;

/// The outcome of checking a requested status change against the order's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Run the side effects of the transition
    Proceed,
    /// The transition has already happened. Report success without side effects.
    AlreadySettled,
    /// The transition is not allowed from the current status
    Reject,
}

pub fn is_settlement_target(status: OrderStatusType) -> bool {
    matches!(status, OrderStatusType::Delivered | OrderStatusType::Fulfilled)
}

/// Decides whether moving an order from `current` to `target` should proceed.
///
/// * Completion (`delivered` or `fulfilled`) is a no-op for an order in any terminal status, so a retried delivery
///   confirmation never settles twice. Any non-terminal order may be completed.
/// * Cancellation is a no-op for a cancelled order and is rejected for a completed one.
/// * Every other change must follow the order lifecycle. Requesting the current status is a no-op.
pub fn check_transition(current: OrderStatusType, target: OrderStatusType) -> GuardDecision {
    use OrderStatusType::*;
    if is_settlement_target(target) {
        return if current.is_terminal() { GuardDecision::AlreadySettled } else { GuardDecision::Proceed };
    }
    match (current, target) {
        (Canceled, Canceled) => GuardDecision::AlreadySettled,
        (Delivered | Fulfilled, Canceled) => GuardDecision::Reject,
        (c, t) if c == t => GuardDecision::AlreadySettled,
        (c, t) if c.can_transition_to(t) => GuardDecision::Proceed,
        _ => GuardDecision::Reject,
    }
}

/// A POS sale is settled at most once per terminal-assigned sale id.
pub fn check_pos_sale(already_recorded: bool) -> GuardDecision {
    if already_recorded {
        GuardDecision::AlreadySettled
    } else {
        GuardDecision::Proceed
    }
}
