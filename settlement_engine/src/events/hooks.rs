use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCancelledEvent,
    OrderSettledEvent,
    PointsAdjustedEvent,
    SettlementEvent,
    TierUpgradedEvent,
};

pub type BoxedHookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_settled_producer: Vec<EventProducer<OrderSettledEvent>>,
    pub tier_upgraded_producer: Vec<EventProducer<TierUpgradedEvent>>,
    pub order_cancelled_producer: Vec<EventProducer<OrderCancelledEvent>>,
    pub points_adjusted_producer: Vec<EventProducer<PointsAdjustedEvent>>,
}

pub struct EventHandlers {
    pub on_order_settled: Option<EventHandler<OrderSettledEvent>>,
    pub on_tier_upgraded: Option<EventHandler<TierUpgradedEvent>>,
    pub on_order_cancelled: Option<EventHandler<OrderCancelledEvent>>,
    pub on_points_adjusted: Option<EventHandler<PointsAdjustedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_settled = hooks.on_order_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_tier_upgraded = hooks.on_tier_upgraded.map(|f| EventHandler::new(buffer_size, f));
        let on_order_cancelled = hooks.on_order_cancelled.map(|f| EventHandler::new(buffer_size, f));
        let on_points_adjusted = hooks.on_points_adjusted.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_settled, on_tier_upgraded, on_order_cancelled, on_points_adjusted }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_settled {
            result.order_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_tier_upgraded {
            result.tier_upgraded_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_cancelled {
            result.order_cancelled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_points_adjusted {
            result.points_adjusted_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns the consumer loop of every registered hook. Each loop stops once the last [`EventProducers`] clone
    /// holding its producer is dropped.
    pub async fn start_handlers(self) {
        spawn_handler(self.on_order_settled);
        spawn_handler(self.on_tier_upgraded);
        spawn_handler(self.on_order_cancelled);
        spawn_handler(self.on_points_adjusted);
    }
}

fn spawn_handler<E: SettlementEvent>(handler: Option<EventHandler<E>>) {
    if let Some(handler) = handler {
        tokio::spawn(handler.run());
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_settled: Option<Handler<OrderSettledEvent>>,
    pub on_tier_upgraded: Option<Handler<TierUpgradedEvent>>,
    pub on_order_cancelled: Option<Handler<OrderCancelledEvent>>,
    pub on_points_adjusted: Option<Handler<PointsAdjustedEvent>>,
}

impl EventHooks {
    pub fn on_order_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSettledEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_settled = Some(Arc::new(f));
        self
    }

    pub fn on_tier_upgraded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TierUpgradedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_tier_upgraded = Some(Arc::new(f));
        self
    }

    pub fn on_order_cancelled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCancelledEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_cancelled = Some(Arc::new(f));
        self
    }

    pub fn on_points_adjusted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PointsAdjustedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_points_adjusted = Some(Arc::new(f));
        self
    }
}
