//! Post-commit hooks.
//!
//! The engine publishes events only after a settlement has committed. The handlers here turn them into customer
//! notifications. Delivery to a messaging provider is outside this server, so notifications are written to the log
//! under the `rse::notifications` target, where a log shipper can pick them up.
use log::*;
use settlement_engine::{
    events::{EventHooks, OrderCancelledEvent, OrderSettledEvent, PointsAdjustedEvent, TierUpgradedEvent},
    settlement_objects::Notification,
};

pub fn notification_hooks(storefront_url: Option<String>) -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_tier_upgraded(move |ev: TierUpgradedEvent| {
            let link = absolute_link(storefront_url.as_deref(), &ev.notification.link);
            Box::pin(async move {
                dispatch(&ev.notification, &link);
            })
        })
        .on_order_settled(|ev: OrderSettledEvent| {
            Box::pin(async move {
                debug!("📬️ Settled {}. {}", ev.summary.reference, ev.summary.message);
            })
        })
        .on_order_cancelled(|ev: OrderCancelledEvent| {
            Box::pin(async move {
                info!("📬️ Order {} was canceled. Restocked: {}", ev.order.order_id, ev.restocked);
            })
        })
        .on_points_adjusted(|ev: PointsAdjustedEvent| {
            Box::pin(async move {
                info!(
                    "📬️ Points for {} adjusted by {} ({}). Balance is now {}",
                    ev.customer.id, ev.entry.delta, ev.entry.reason, ev.customer.points_balance
                );
            })
        });
    hooks
}

fn dispatch(notification: &Notification, link: &str) {
    info!(
        target: "rse::notifications",
        "📬️ To {}: {} {} {link}",
        notification.customer_id,
        notification.title,
        notification.body
    );
}

/// Resolves a storefront-relative link against the storefront's base URL, if one is configured.
pub fn absolute_link(base: Option<&str>, link: &str) -> String {
    match base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), link.trim_start_matches('/')),
        None => link.to_string(),
    }
}
