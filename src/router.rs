//! Envelope Router (spec §4.D) — routing table from `speakerUri` to an async
//! delivery handler, with privacy-aware recipient selection and bounded
//! per-delivery timeouts.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Duration;

use crate::config::RouterConfig;
use crate::envelope::{is_private_utterance, Envelope, EventObject};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An envelope delivery target. Implementors receive the full envelope (the
/// recipient extracts its own events via `Envelope::events_for`).
pub trait EnvelopeHandler: Send + Sync {
    fn deliver(&self, envelope: Envelope) -> BoxFuture<'static, Result<(), String>>;
}

/// Routing table mapping `speakerUri` to its registered handler. Registration
/// is envelope-delivery plumbing only — it does not constitute agent
/// registration in the protocol sense (spec §4.D).
pub struct EnvelopeRouter {
    handlers: RwLock<HashMap<String, Arc<dyn EnvelopeHandler>>>,
    config: RouterConfig,
    /// Bounds deliveries in flight at once (spec §5 "Router dispatch queue:
    /// cap 1000"); a recipient that can't acquire a permit is dropped with
    /// backpressure rather than queued, since this layer has no durable
    /// queue (§4.D "no retries or durable queue at this layer").
    dispatch_permits: Arc<Semaphore>,
}

impl EnvelopeRouter {
    pub fn new(config: RouterConfig) -> Self {
        let dispatch_permits = Arc::new(Semaphore::new(config.queue_size));
        Self { handlers: RwLock::new(HashMap::new()), config, dispatch_permits }
    }

    /// Last-write-wins registration.
    pub fn register(&self, speaker_uri: &str, handler: Arc<dyn EnvelopeHandler>) {
        self.handlers.write().unwrap_or_else(|e| e.into_inner()).insert(speaker_uri.to_string(), handler);
    }

    pub fn unregister(&self, speaker_uri: &str) {
        self.handlers.write().unwrap_or_else(|e| e.into_inner()).remove(speaker_uri);
    }

    fn recipients_for(&self, event: &EventObject, sender_uri: &str) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        match &event.to {
            None => handlers.keys().filter(|uri| uri.as_str() != sender_uri).cloned().collect(),
            Some(to) if is_private_utterance(event) => {
                to.speaker_uri.iter().filter(|uri| handlers.contains_key(uri.as_str())).cloned().collect()
            }
            Some(to) => match &to.speaker_uri {
                Some(uri) if handlers.contains_key(uri.as_str()) => vec![uri.clone()],
                _ => vec![],
            },
        }
    }

    /// Routes every event in `envelope.events` to its recipients, honoring
    /// the privacy rule that only applies to `utterance` events. Returns
    /// true iff at least one handler completed successfully.
    pub async fn route(&self, envelope: &Envelope) -> bool {
        let mut deliveries: JoinSet<Result<(), String>> = JoinSet::new();
        let mut attempted = false;

        for event in &envelope.events {
            let recipients = self.recipients_for(event, &envelope.sender.speaker_uri);
            for recipient in recipients {
                let handler = {
                    let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
                    handlers.get(&recipient).cloned()
                };
                let Some(handler) = handler else { continue };
                let Ok(permit) = Arc::clone(&self.dispatch_permits).try_acquire_owned() else {
                    println!(
                        "⚠️  router dispatch queue full ({} in flight): dropping delivery to {recipient}",
                        self.config.queue_size
                    );
                    continue;
                };
                attempted = true;
                let envelope_clone = envelope.clone();
                let timeout = Duration::from_millis(self.config.delivery_timeout_ms);
                let recipient_for_log = recipient.clone();
                deliveries.spawn(async move {
                    let _permit = permit;
                    match tokio::time::timeout(timeout, handler.deliver(envelope_clone)).await {
                        Ok(result) => result,
                        Err(_) => Err(format!("delivery to {recipient_for_log} timed out")),
                    }
                });
            }
        }

        if !attempted {
            return false;
        }

        let mut routed_any = false;
        while let Some(outcome) = deliveries.join_next().await {
            match outcome {
                Ok(Ok(())) => routed_any = true,
                Ok(Err(e)) => println!("⚠️  delivery failed: {e}"),
                Err(e) => println!("⚠️  delivery task panicked: {e}"),
            }
        }
        routed_any
    }
}
