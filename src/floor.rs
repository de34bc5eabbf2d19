//! Floor Control state machine (spec §4.B) — per-conversation arbitration of
//! the exclusive speaking right, with priority queue, lazy timeout, and
//! revocation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

use crate::config::FloorControlConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Granted,
    Revoked,
    Released,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Granted => "granted",
            TransitionKind::Revoked => "revoked",
            TransitionKind::Released => "released",
        }
    }
}

/// A snapshot of one pending request, as carried in a transition's `queueAfter`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedEntry {
    #[serde(rename = "speakerUri")]
    pub speaker_uri: String,
    pub priority: i64,
}

/// A published state change (§4.B "Transition record"). Consumed by the
/// Subscription Hub and re-broadcast to observers.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub kind: TransitionKind,
    #[serde(rename = "speakerUri")]
    pub speaker_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "holderAfter", skip_serializing_if = "Option::is_none")]
    pub holder_after: Option<String>,
    #[serde(rename = "queueAfter")]
    pub queue_after: Vec<QueuedEntry>,
}

#[derive(Debug, Clone)]
struct FloorHolder {
    speaker_uri: String,
    granted_at: Instant,
}

/// A queued request. `Ord` implements the `(-priority, timestamp ascending)`
/// sort key from spec §3 directly, so the queue can be kept stable-sorted
/// with a single `sort_by`.
#[derive(Debug, Clone)]
struct FloorRequest {
    speaker_uri: String,
    priority: i64,
    timestamp: Instant,
}

impl FloorRequest {
    fn sort_key(&self) -> (i64, Instant) {
        (-self.priority, self.timestamp)
    }
}

impl PartialEq for FloorRequest {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}
impl Eq for FloorRequest {}

impl PartialOrd for FloorRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloorRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[derive(Debug, Default)]
struct ConversationState {
    holder: Option<FloorHolder>,
    queue: Vec<FloorRequest>,
    assigned_floor_roles: HashMap<String, Vec<String>>,
}

impl ConversationState {
    fn queue_snapshot(&self) -> Vec<QueuedEntry> {
        self.queue
            .iter()
            .map(|r| QueuedEntry { speaker_uri: r.speaker_uri.clone(), priority: r.priority })
            .collect()
    }

    fn holder_uri(&self) -> Option<String> {
        self.holder.as_ref().map(|h| h.speaker_uri.clone())
    }
}

/// Result of a floor metadata query (§4.B `getMetadata`).
#[derive(Debug, Clone, Default)]
pub struct FloorMetadata {
    pub assigned_floor_roles: HashMap<String, Vec<String>>,
    pub floor_granted: Vec<String>,
}

/// Per-conversation floor arbitration, guarded by a single coarse mutex
/// (spec §5 permits a coarse mutex so long as mutation is effectively
/// single-writer per conversation id).
pub struct FloorControl {
    conversations: Mutex<HashMap<String, ConversationState>>,
    config: FloorControlConfig,
    on_transition: Box<dyn Fn(Transition) + Send + Sync>,
}

impl FloorControl {
    pub fn new(config: FloorControlConfig, on_transition: impl Fn(Transition) + Send + Sync + 'static) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            config,
            on_transition: Box::new(on_transition),
        }
    }

    fn publish(&self, transition: Transition) {
        (self.on_transition)(transition);
    }

    /// Grants immediately from IDLE, otherwise enqueues. Returns `granted`.
    pub fn request_floor(&self, conversation_id: &str, speaker_uri: &str, priority: i64) -> bool {
        let mut conversations = self.conversations.lock().unwrap_or_else(|e| e.into_inner());
        let state = conversations.entry(conversation_id.to_string()).or_default();
        self.enforce_timeout_locked(conversation_id, state);

        if state.holder.is_none() {
            state.holder = Some(FloorHolder { speaker_uri: speaker_uri.to_string(), granted_at: Instant::now() });
            println!("🎙️  floor granted: conversation={conversation_id} speaker={speaker_uri}");
            self.publish(Transition {
                conversation_id: conversation_id.to_string(),
                kind: TransitionKind::Granted,
                speaker_uri: speaker_uri.to_string(),
                reason: None,
                holder_after: state.holder_uri(),
                queue_after: state.queue_snapshot(),
            });
            return true;
        }

        if state.queue.len() >= self.config.queue_max_size {
            println!("⚠️  floor queue overflow: conversation={conversation_id} speaker={speaker_uri}");
            return false;
        }

        state.queue.push(FloorRequest {
            speaker_uri: speaker_uri.to_string(),
            priority,
            timestamp: Instant::now(),
        });
        state.queue.sort();
        false
    }

    /// Releases the floor if `speaker_uri` is the current holder; promotes
    /// the queue head, if any. Returns `released`.
    pub fn yield_floor(&self, conversation_id: &str, speaker_uri: &str) -> bool {
        let mut conversations = self.conversations.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = conversations.get_mut(conversation_id) else { return false };
        self.enforce_timeout_locked(conversation_id, state);

        match &state.holder {
            Some(h) if h.speaker_uri == speaker_uri => {}
            _ => return false,
        }

        state.holder = None;
        println!("🎙️  floor released: conversation={conversation_id} speaker={speaker_uri}");
        self.publish(Transition {
            conversation_id: conversation_id.to_string(),
            kind: TransitionKind::Released,
            speaker_uri: speaker_uri.to_string(),
            reason: None,
            holder_after: None,
            queue_after: state.queue_snapshot(),
        });

        self.promote_head_locked(conversation_id, state);
        true
    }

    /// Promotes the next queued request into `GRANTED`, if the queue is
    /// non-empty. Assumes the caller already cleared `holder`.
    fn promote_head_locked(&self, conversation_id: &str, state: &mut ConversationState) {
        if state.queue.is_empty() {
            return;
        }
        let next = state.queue.remove(0);
        state.holder = Some(FloorHolder { speaker_uri: next.speaker_uri.clone(), granted_at: Instant::now() });
        println!("🎙️  floor granted (from queue): conversation={conversation_id} speaker={}", next.speaker_uri);
        self.publish(Transition {
            conversation_id: conversation_id.to_string(),
            kind: TransitionKind::Granted,
            speaker_uri: next.speaker_uri,
            reason: None,
            holder_after: state.holder_uri(),
            queue_after: state.queue_snapshot(),
        });
    }

    /// Current holder, applying lazy timeout enforcement first (§4.B).
    pub fn get_holder(&self, conversation_id: &str) -> Option<String> {
        let mut conversations = self.conversations.lock().unwrap_or_else(|e| e.into_inner());
        let state = conversations.entry(conversation_id.to_string()).or_default();
        self.enforce_timeout_locked(conversation_id, state);
        state.holder_uri()
    }

    /// Revokes the current holder with the given reason token
    /// (`@timeout`, `@override`, `@uninvite`), promoting the queue head.
    /// Returns whether a holder was actually revoked.
    pub fn revoke(&self, conversation_id: &str, reason: &str) -> bool {
        let mut conversations = self.conversations.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = conversations.get_mut(conversation_id) else { return false };
        self.revoke_locked(conversation_id, state, reason)
    }

    fn revoke_locked(&self, conversation_id: &str, state: &mut ConversationState, reason: &str) -> bool {
        let Some(holder) = state.holder.take() else { return false };
        println!("⏱️  floor revoked: conversation={conversation_id} speaker={} reason={reason}", holder.speaker_uri);
        self.publish(Transition {
            conversation_id: conversation_id.to_string(),
            kind: TransitionKind::Revoked,
            speaker_uri: holder.speaker_uri,
            reason: Some(reason.to_string()),
            holder_after: None,
            queue_after: state.queue_snapshot(),
        });
        self.promote_head_locked(conversation_id, state);
        true
    }

    fn enforce_timeout_locked(&self, conversation_id: &str, state: &mut ConversationState) {
        let expired = state
            .holder
            .as_ref()
            .is_some_and(|h| h.granted_at.elapsed().as_secs() > self.config.max_hold_secs);
        if expired {
            self.revoke_locked(conversation_id, state, "@timeout");
        }
    }

    /// `{ assignedFloorRoles, floorGranted }` (§4.B `getMetadata`).
    pub fn get_metadata(&self, conversation_id: &str) -> FloorMetadata {
        let mut conversations = self.conversations.lock().unwrap_or_else(|e| e.into_inner());
        let state = conversations.entry(conversation_id.to_string()).or_default();
        self.enforce_timeout_locked(conversation_id, state);
        FloorMetadata {
            assigned_floor_roles: state.assigned_floor_roles.clone(),
            floor_granted: state.holder_uri().into_iter().collect(),
        }
    }
}
