use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Coupon, Customer, LoyaltyPolicy, NewOrder, Order, OrderId, OrderStatusType, PosSale, Product},
    engine_api::settlement_objects::{
        CancelOutcome,
        PaymentOutcome,
        PointsAdjustment,
        SettlementOutcome,
        SettlementSummary,
        StatusChange,
    },
    events::{EventProducers, OrderCancelledEvent, OrderSettledEvent, PointsAdjustedEvent, TierUpgradedEvent},
    traits::{SettlementDatabase, SettlementError},
};

/// `SettlementApi` is the primary API for settling orders and sales, and for every other write the engine performs.
///
/// Each call is a single transaction in the backend. Events are published only after that call has returned
/// successfully, i.e. after the transaction committed. A failed or rolled back call never publishes anything.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> SettlementApi<B>
where B: SettlementDatabase
{
    /// Hands an order over from checkout. Regular orders reserve their stock now.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, SettlementError> {
        let order_id = order.order_id.clone();
        let order = self.db.place_order(order).await?;
        debug!("🧾️ Order {order_id} placed with status {}", order.status);
        Ok(order)
    }

    /// Records the payment gateway's capture result for an order.
    pub async fn record_payment(
        &self,
        order_id: &OrderId,
        captured: bool,
        reference: &str,
    ) -> Result<PaymentOutcome, SettlementError> {
        let outcome = self.db.record_payment(order_id, captured, reference).await?;
        debug!("🧾️ {}", outcome.message());
        Ok(outcome)
    }

    /// Moves an order along its lifecycle without settling or cancelling it.
    pub async fn advance_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<StatusChange, SettlementError> {
        self.db.advance_order_status(order_id, new_status).await
    }

    /// Settles an online order as `delivered` or `fulfilled`.
    ///
    /// Calling this again for a settled order is safe. It returns [`SettlementOutcome::AlreadySettled`] and changes
    /// nothing.
    pub async fn complete_order(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
    ) -> Result<SettlementOutcome, SettlementError> {
        let outcome = self.db.complete_order(order_id, target).await?;
        self.publish_settlement(&outcome).await;
        Ok(outcome)
    }

    /// Settles a point-of-sale checkout. Calling this again with the same sale id is safe.
    pub async fn complete_pos_sale(&self, sale: PosSale) -> Result<SettlementOutcome, SettlementError> {
        let outcome = self.db.complete_pos_sale(sale).await?;
        self.publish_settlement(&outcome).await;
        Ok(outcome)
    }

    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, SettlementError> {
        let outcome = self.db.cancel_order(order_id).await?;
        if let CancelOutcome::Canceled { order, restocked } = &outcome {
            for emitter in &self.producers.order_cancelled_producer {
                debug!("📬️ Notifying order cancelled hook subscribers");
                emitter.publish_event(OrderCancelledEvent::new(order.clone(), *restocked)).await;
            }
        }
        Ok(outcome)
    }

    /// An administrative correction to a customer's points. Unlike settlement, this may take the balance below zero.
    pub async fn adjust_points(
        &self,
        customer_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<PointsAdjustment, SettlementError> {
        let adjustment = self.db.adjust_points(customer_id, delta, reason).await?;
        for emitter in &self.producers.points_adjusted_producer {
            debug!("📬️ Notifying points adjusted hook subscribers");
            let event = PointsAdjustedEvent::new(adjustment.customer.clone(), adjustment.entry.clone());
            emitter.publish_event(event).await;
        }
        Ok(adjustment)
    }

    pub async fn upsert_product(&self, product: Product) -> Result<Product, SettlementError> {
        self.db.upsert_product(product).await
    }

    pub async fn fetch_or_create_customer(&self, customer_id: &str) -> Result<Customer, SettlementError> {
        self.db.fetch_or_create_customer(customer_id).await
    }

    pub async fn set_loyalty_policy(&self, policy: LoyaltyPolicy) -> Result<LoyaltyPolicy, SettlementError> {
        self.db.set_loyalty_policy(policy).await
    }

    pub async fn upsert_coupon(&self, code: &str) -> Result<Coupon, SettlementError> {
        self.db.upsert_coupon(code).await
    }

    async fn publish_settlement(&self, outcome: &SettlementOutcome) {
        let Some(summary) = outcome.summary() else {
            return;
        };
        self.call_order_settled_hook(summary).await;
        if let Some(change) = &summary.tier_change {
            for emitter in &self.producers.tier_upgraded_producer {
                debug!("📬️ Notifying tier upgraded hook subscribers");
                emitter.publish_event(TierUpgradedEvent::new(change.clone())).await;
            }
        }
    }

    async fn call_order_settled_hook(&self, summary: &SettlementSummary) {
        for emitter in &self.producers.order_settled_producer {
            debug!("📬️ Notifying order settled hook subscribers");
            emitter.publish_event(OrderSettledEvent::new(summary.clone())).await;
        }
    }
}
