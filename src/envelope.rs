//! Envelope Model (spec §4.A) — the immutable wire-format value type.
//!
//! Wraps and unwraps the `openFloor` JSON envelope, validates required fields,
//! and answers addressing queries (`events_for`) used by the router.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The closed set of event types carried by an envelope. Anything outside this
/// set fails to deserialize, which `Envelope::parse` turns into `MalformedEnvelope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "utterance")]
    Utterance,
    #[serde(rename = "context")]
    Context,
    #[serde(rename = "invite")]
    Invite,
    #[serde(rename = "uninvite")]
    Uninvite,
    #[serde(rename = "acceptInvite")]
    AcceptInvite,
    #[serde(rename = "declineInvite")]
    DeclineInvite,
    #[serde(rename = "bye")]
    Bye,
    #[serde(rename = "getManifests")]
    GetManifests,
    #[serde(rename = "publishManifests")]
    PublishManifests,
    #[serde(rename = "requestFloor")]
    RequestFloor,
    #[serde(rename = "grantFloor")]
    GrantFloor,
    #[serde(rename = "revokeFloor")]
    RevokeFloor,
    #[serde(rename = "yieldFloor")]
    YieldFloor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    pub version: String,
}

/// An identification record, used both for `conversation.conversants` and for
/// directory manifests (§3 Manifest).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    #[serde(rename = "speakerUri")]
    pub speaker_uri: String,
    #[serde(rename = "serviceUrl", skip_serializing_if = "Option::is_none", default)]
    pub service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub organization: Option<String>,
    #[serde(rename = "conversationalName", skip_serializing_if = "Option::is_none", default)]
    pub conversational_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub synopsis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationObject {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub conversants: Option<Vec<Identification>>,
    #[serde(rename = "assignedFloorRoles", skip_serializing_if = "Option::is_none", default)]
    pub assigned_floor_roles: Option<HashMap<String, Vec<String>>>,
    #[serde(rename = "floorGranted", skip_serializing_if = "Option::is_none", default)]
    pub floor_granted: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderObject {
    #[serde(rename = "speakerUri")]
    pub speaker_uri: String,
    #[serde(rename = "serviceUrl", skip_serializing_if = "Option::is_none", default)]
    pub service_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToObject {
    #[serde(rename = "speakerUri", skip_serializing_if = "Option::is_none", default)]
    pub speaker_uri: Option<String>,
    #[serde(rename = "serviceUrl", skip_serializing_if = "Option::is_none", default)]
    pub service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub private: Option<bool>,
}

impl ToObject {
    fn is_private(&self) -> bool {
        self.private.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventObject {
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<ToObject>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameters: Option<serde_json::Value>,
}

impl EventObject {
    /// Integer priority carried in `parameters.priority`, defaulting to 0 when
    /// absent per spec §4.E (`requestFloor` pre-routing effect).
    pub fn priority(&self) -> i64 {
        self.parameters
            .as_ref()
            .and_then(|p| p.get("priority"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    /// Extracts plain-text utterance content from `parameters.dialogEvent.features.text.tokens`,
    /// per the dynamic-payload convention in spec.md §9.
    pub fn utterance_text(&self) -> Option<String> {
        let tokens = self
            .parameters
            .as_ref()?
            .get("dialogEvent")?
            .get("features")?
            .get("text")?
            .get("tokens")?
            .as_array()?;
        let text: String = tokens
            .iter()
            .filter_map(|t| t.get("token").and_then(|v| v.as_str()))
            .collect::<Vec<_>>()
            .join("");
        Some(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub schema: SchemaObject,
    pub conversation: ConversationObject,
    pub sender: SenderObject,
    pub events: Vec<EventObject>,
}

/// Wrapped wire form: `{ "openFloor": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EnvelopeDocument {
    #[serde(rename = "openFloor")]
    open_floor: Envelope,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MalformedEnvelope(pub String);

impl fmt::Display for MalformedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed envelope: {}", self.0)
    }
}

impl std::error::Error for MalformedEnvelope {}

impl Envelope {
    /// Parses a wrapped (`{"openFloor": {...}}`) or unwrapped envelope document.
    /// Fails when a required field is missing, `events` is empty, or `eventType`
    /// falls outside the closed set (surfaced as a normal deserialize error).
    pub fn parse(document: &serde_json::Value) -> Result<Envelope, MalformedEnvelope> {
        let envelope = if document.get("openFloor").is_some() {
            serde_json::from_value::<EnvelopeDocument>(document.clone())
                .map(|d| d.open_floor)
                .map_err(|e| MalformedEnvelope(e.to_string()))?
        } else {
            serde_json::from_value::<Envelope>(document.clone())
                .map_err(|e| MalformedEnvelope(e.to_string()))?
        };

        if envelope.schema.version.trim().is_empty() {
            return Err(MalformedEnvelope("schema.version is required".into()));
        }
        if envelope.conversation.id.trim().is_empty() {
            return Err(MalformedEnvelope("conversation.id is required".into()));
        }
        if envelope.sender.speaker_uri.trim().is_empty() {
            return Err(MalformedEnvelope("sender.speakerUri is required".into()));
        }
        if envelope.events.is_empty() {
            return Err(MalformedEnvelope("events must contain at least one event".into()));
        }

        Ok(envelope)
    }

    /// Serializes to the wrapped wire form, omitting absent fields.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::to_value(EnvelopeDocument {
            open_floor: self.clone(),
        })
        .expect("Envelope always serializes")
    }

    /// Events addressed to `speaker_uri` (and, additionally, to `service_url`
    /// when given): those with no `to` (broadcast), plus those whose
    /// `to.speakerUri` matches `speaker_uri`, plus those whose
    /// `to.serviceUrl` matches `service_url` (when supplied) — in original
    /// order. Spec §4.A: "`to.speakerUri == speakerUri` (or, if provided,
    /// `to.serviceUrl == serviceUrl`)" is an additional way to match, not a
    /// replacement for the speakerUri check.
    pub fn events_for<'a>(&'a self, speaker_uri: &str, service_url: Option<&str>) -> Vec<&'a EventObject> {
        self.events
            .iter()
            .filter(|event| match &event.to {
                None => true,
                Some(to) => {
                    to.speaker_uri.as_deref() == Some(speaker_uri)
                        || (service_url.is_some() && to.service_url.as_deref() == service_url)
                }
            })
            .collect()
    }
}

/// Whether routing should treat this event as a private, single-recipient
/// delivery. Per spec §3 "Invariant (privacy)": only meaningful for
/// `utterance` events; all other event types ignore the flag.
pub fn is_private_utterance(event: &EventObject) -> bool {
    event.event_type == EventType::Utterance
        && event.to.as_ref().is_some_and(ToObject::is_private)
}
