//! Post-commit event delivery.
//!
//! Every settlement event type gets its own [`EventHandler`]: a bounded queue that the [`SettlementApi`] feeds
//! through [`EventProducer`]s once a transaction has committed, and a single consumer loop that runs the registered
//! hook for each event on its own task. Hooks only ever see the event itself, never the store, so a slow or failing
//! hook cannot hold up or undo a settlement.
//!
//! The consumer loop ends when the last producer is dropped. It then waits for in-flight hooks and reports how many
//! ran to completion.
//!
//! [`SettlementApi`]: crate::SettlementApi
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

use crate::events::SettlementEvent;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// What happened to the events a handler received over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub handled: usize,
    /// Hooks that panicked. Their events are lost.
    pub failed: usize,
}

pub struct EventHandler<E: SettlementEvent> {
    queue: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    hook: Handler<E>,
}

impl<E: SettlementEvent> EventHandler<E> {
    pub fn new(buffer_size: usize, hook: Handler<E>) -> Self {
        let (sender, queue) = mpsc::channel(buffer_size.max(1));
        Self { queue, sender, hook }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    /// Runs hooks until every producer has been dropped, then drains the hooks still running.
    pub async fn run(self) -> DispatchReport {
        let Self { mut queue, sender, hook } = self;
        // Only producers may keep the queue open
        drop(sender);
        debug!("📬️ {} handler started", E::KIND);
        let mut jobs = JoinSet::new();
        let mut report = DispatchReport::default();
        while let Some(event) = queue.recv().await {
            trace!("📬️ Dispatching {} for {}", E::KIND, event.reference());
            jobs.spawn((hook)(event));
            // reap finished hooks as we go, so the set only holds the ones still running
            while let Some(done) = jobs.try_join_next() {
                tally(&mut report, done);
            }
        }
        if !jobs.is_empty() {
            debug!("📬️ {} handler waiting for {} running hooks", E::KIND, jobs.len());
        }
        while let Some(done) = jobs.join_next().await {
            tally(&mut report, done);
        }
        debug!("📬️ {} handler stopped. {} handled, {} failed", E::KIND, report.handled, report.failed);
        report
    }
}

fn tally(report: &mut DispatchReport, done: Result<(), tokio::task::JoinError>) {
    match done {
        Ok(()) => report.handled += 1,
        Err(e) => {
            error!("📬️ An event hook did not complete. {e}");
            report.failed += 1;
        },
    }
}

#[derive(Clone)]
pub struct EventProducer<E: SettlementEvent> {
    sender: mpsc::Sender<E>,
}

impl<E: SettlementEvent> EventProducer<E> {
    /// Queues the event for the hook. Waits if the queue is full. An event published after the handler has stopped
    /// is logged and dropped, since the settlement it describes has already committed.
    pub async fn publish_event(&self, event: E) {
        let reference = event.reference();
        if self.sender.send(event).await.is_err() {
            error!("📬️ {} for {reference} was not delivered. The handler has stopped.", E::KIND);
        }
    }
}
