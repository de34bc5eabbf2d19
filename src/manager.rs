//! Floor Manager composition (spec §4.E) — the top-level entry point that
//! orchestrates Floor Control, the Subscription Hub, and the Envelope
//! Router for a single process.

use std::sync::Arc;

use crate::envelope::{ConversationObject, Envelope, EventObject, EventType, SchemaObject, SenderObject, ToObject};
use crate::floor::{FloorControl, Transition};
use crate::hub::SubscriptionHub;
use crate::router::EnvelopeRouter;

/// Default authorization for `revokeFloor` absent a real identity system:
/// only the configured convener URI may force a revoke (spec §9 open
/// question 3, resolved via `original_source/floor_manager/manager.py`'s
/// convener-identity check — see DESIGN.md).
pub const DEFAULT_CONVENER_URI: &str = "tag:floor.manager,2026:convener";

pub struct FloorManager {
    pub floor_control: Arc<FloorControl>,
    pub hub: Arc<SubscriptionHub>,
    pub router: Arc<EnvelopeRouter>,
    convener_uri: String,
}

impl FloorManager {
    pub fn new(floor_control: Arc<FloorControl>, hub: Arc<SubscriptionHub>, router: Arc<EnvelopeRouter>) -> Self {
        Self { floor_control, hub, router, convener_uri: DEFAULT_CONVENER_URI.to_string() }
    }

    pub fn with_convener_uri(mut self, convener_uri: impl Into<String>) -> Self {
        self.convener_uri = convener_uri.into();
        self
    }

    /// Applies pre-routing effects for each event in order, then routes the
    /// envelope. Returns true iff any step produced a visible effect.
    pub async fn process_envelope(&self, envelope: &Envelope) -> bool {
        let sender_uri = &envelope.sender.speaker_uri;
        let conversation_id = &envelope.conversation.id;
        let mut mutated = false;

        for event in &envelope.events {
            mutated |= self.apply_pre_routing_effect(conversation_id, sender_uri, event);
        }

        let routed = self.router.route(envelope).await;
        mutated || routed
    }

    fn apply_pre_routing_effect(&self, conversation_id: &str, sender_uri: &str, event: &EventObject) -> bool {
        match event.event_type {
            EventType::RequestFloor => self.floor_control.request_floor(conversation_id, sender_uri, event.priority()),
            EventType::YieldFloor => self.floor_control.yield_floor(conversation_id, sender_uri),
            EventType::RevokeFloor => {
                if sender_uri != self.convener_uri {
                    println!("⚠️  revokeFloor ignored: {sender_uri} is not the convener");
                    return false;
                }
                let reason = event.reason.as_deref().unwrap_or("@override");
                self.floor_control.revoke(conversation_id, reason)
            }
            _ => false,
        }
    }

    /// Constructor helper: a well-formed envelope for `sender` carrying
    /// `events`.
    pub fn create_envelope(&self, conversation_id: &str, sender_uri: &str, events: Vec<EventObject>) -> Envelope {
        Envelope {
            schema: SchemaObject { version: "1.1.0".to_string() },
            conversation: ConversationObject { id: conversation_id.to_string(), ..Default::default() },
            sender: SenderObject { speaker_uri: sender_uri.to_string(), service_url: None },
            events,
        }
    }

    /// Builds and routes a single-event utterance envelope.
    pub async fn send_utterance(
        &self,
        conversation_id: &str,
        sender_uri: &str,
        target_uri: Option<&str>,
        text: &str,
        private: bool,
    ) -> Envelope {
        let to = target_uri.map(|uri| ToObject {
            speaker_uri: Some(uri.to_string()),
            service_url: None,
            private: Some(private),
        });
        let event = EventObject {
            event_type: EventType::Utterance,
            to,
            reason: None,
            parameters: Some(serde_json::json!({
                "dialogEvent": {
                    "speakerUri": sender_uri,
                    "features": { "text": { "mimeType": "text/plain", "tokens": [{"token": text}] } }
                }
            })),
        };
        let envelope = self.create_envelope(conversation_id, sender_uri, vec![event]);
        self.router.route(&envelope).await;
        envelope
    }

    pub fn register_route(&self, speaker_uri: &str, handler: Arc<dyn crate::router::EnvelopeHandler>) {
        self.router.register(speaker_uri, handler);
    }

    pub fn unregister_route(&self, speaker_uri: &str) {
        self.router.unregister(speaker_uri);
    }

    pub fn subscribe(&self, conversation_id: &str) -> crate::hub::Subscription {
        self.hub.subscribe(conversation_id)
    }
}

/// Wires a `FloorControl` whose transitions are published straight to the
/// given hub — the composition root both `lib.rs` and tests use.
pub fn publish_transitions_to(hub: Arc<SubscriptionHub>) -> impl Fn(Transition) + Send + Sync + 'static {
    move |transition| hub.publish(transition)
}
