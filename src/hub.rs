//! Subscription Hub (spec §4.C) — per-conversation fan-out of floor
//! transitions to subscribed observers.
//!
//! `tokio::sync::broadcast` already implements exactly the policy spec §4.C
//! asks for: bounded per-subscriber buffer, drop-oldest on overflow, and a
//! `RecvError::Lagged(n)` that tells a lagging subscriber precisely how many
//! transitions it missed. We lean on that instead of hand-rolling a ring
//! buffer, the way the teacher leans on `tokio::sync::broadcast` for its
//! single global `EventBus`.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::config::HubConfig;
use crate::floor::Transition;

/// A live subscription to one conversation's transition stream.
pub struct Subscription {
    receiver: broadcast::Receiver<Transition>,
    pub lag_count: u64,
}

/// What a subscriber actually observes on each poll: either a transition, a
/// lag notice (buffer overflowed and some transitions were dropped), or the
/// stream closing.
pub enum SubscriptionEvent {
    Transition(Transition),
    Lagged(u64),
    Closed,
}

impl Subscription {
    /// Awaits the next transition or lag notice. `lag_count` is running total.
    pub async fn recv(&mut self) -> SubscriptionEvent {
        match self.receiver.recv().await {
            Ok(transition) => SubscriptionEvent::Transition(transition),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                self.lag_count += n;
                SubscriptionEvent::Lagged(n)
            }
            Err(broadcast::error::RecvError::Closed) => SubscriptionEvent::Closed,
        }
    }
}

/// Fan-out hub, one lazily-created broadcast channel per conversation id.
pub struct SubscriptionHub {
    channels: Mutex<HashMap<String, broadcast::Sender<Transition>>>,
    config: HubConfig,
}

impl SubscriptionHub {
    pub fn new(config: HubConfig) -> Self {
        Self { channels: Mutex::new(HashMap::new()), config }
    }

    fn channel_for(&self, conversation_id: &str) -> broadcast::Sender<Transition> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(conversation_id.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0)
            .clone()
    }

    /// Subscribes to a conversation's transition stream, creating the
    /// channel lazily if this is the first subscriber.
    pub fn subscribe(&self, conversation_id: &str) -> Subscription {
        let sender = self.channel_for(conversation_id);
        Subscription { receiver: sender.subscribe(), lag_count: 0 }
    }

    /// Non-blocking publish; subscribers with full buffers drop their oldest
    /// entry rather than stalling the publisher (spec §4.C). Absence of
    /// subscribers is not an error.
    pub fn publish(&self, transition: Transition) {
        let sender = self.channel_for(&transition.conversation_id);
        let _ = sender.send(transition);
    }

    /// Releasing a `Subscription` (drop) is the idempotent unsubscribe; no
    /// explicit handle-based API is needed since `broadcast::Receiver`
    /// already tears itself down on drop.
    pub fn unsubscribe(&self, _subscription: Subscription) {}
}
