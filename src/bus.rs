//! Ordered publish/subscribe channel for console events.

use crate::events::ConsoleEvent;
use derive_more::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{error, info, instrument};

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("subscription#{}", _0)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&ConsoleEvent)>;

/// Synchronous broadcast of [`ConsoleEvent`]s to every subscriber, in
/// subscription order. A panicking subscriber is logged and skipped; the
/// remaining subscribers still receive the event. Late subscribers get no
/// replay.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber.
    pub fn subscribe(&mut self, callback: impl FnMut(&ConsoleEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber. Returns whether it was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers `event` to every subscriber. Returns how many handled it
    /// without panicking.
    #[instrument(skip(self, event), fields(kind = event.kind()))]
    pub fn publish(&mut self, event: &ConsoleEvent) -> usize {
        let mut delivered = 0;
        for (id, callback) in &mut self.subscribers {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => delivered += 1,
                Err(_) => error!(subscription = %id, "Subscriber panicked, continuing"),
            }
        }
        delivered
    }

    /// Subscribes a logger that records every event through `tracing`.
    pub fn log_events(&mut self) -> SubscriptionId {
        self.subscribe(|event| match event {
            ConsoleEvent::LegalMove { player, mv, .. } => {
                info!(seat = %player.seat, color = %player.color, mv = %mv, "Legal move")
            }
            ConsoleEvent::IllegalMove { player, mv } => {
                info!(seat = %player.seat, color = %player.color, mv = %mv, "Illegal move")
            }
            ConsoleEvent::MoveRequest { player } => {
                info!(seat = %player.seat, color = %player.color, "Move requested")
            }
            ConsoleEvent::GameOver { won_color } => info!(?won_color, "Game over"),
            other => info!(kind = other.kind(), "Console event"),
        })
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("next_id", &self.next_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
