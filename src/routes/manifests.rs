use std::collections::HashSet;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::directory::{AgentDirectory, Manifest, ManifestFilter, ManifestStatus};
use crate::envelope::{ConversationObject, Envelope, EventObject, EventType, Identification, SchemaObject, SenderObject};

fn manifests_response_envelope(conversation_id: &str, manifests: &[Manifest]) -> serde_json::Value {
    let envelope = Envelope {
        schema: SchemaObject { version: "1.1.0".to_string() },
        conversation: ConversationObject { id: conversation_id.to_string(), ..Default::default() },
        sender: SenderObject { speaker_uri: "tag:floor.manager,2026:directory".to_string(), service_url: None },
        events: vec![EventObject {
            event_type: EventType::PublishManifests,
            to: None,
            reason: None,
            parameters: Some(serde_json::json!({
                "manifests": manifests,
                "count": manifests.len()
            })),
        }],
    };
    envelope.to_document()
}

fn parse_manifest_entry(value: &serde_json::Value) -> Option<(Identification, HashSet<String>, serde_json::Value, ManifestStatus)> {
    let identification: Identification = serde_json::from_value(value.get("identification")?.clone()).ok()?;
    let capabilities: HashSet<String> = value
        .get("capabilities")
        .and_then(|c| c.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let metadata = value.get("metadata").cloned().unwrap_or(serde_json::json!({}));
    let status = value
        .get("status")
        .and_then(|s| s.as_str())
        .map(|s| match s {
            "inactive" => ManifestStatus::Inactive,
            "deprecated" => ManifestStatus::Deprecated,
            _ => ManifestStatus::Active,
        })
        .unwrap_or(ManifestStatus::Active);
    Some((identification, capabilities, metadata, status))
}

#[post("/api/v1/manifests/publish", format = "json", data = "<body>")]
pub fn publish_manifests(
    directory: &State<AgentDirectory>,
    body: Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let envelope = Envelope::parse(&body).map_err(|e| (Status::BadRequest, Json(serde_json::json!({"error": e.to_string()}))))?;

    let entries: Vec<_> = envelope
        .events
        .iter()
        .filter(|e| e.event_type == EventType::PublishManifests)
        .filter_map(|e| e.parameters.as_ref())
        .filter_map(|p| p.get("manifests"))
        .filter_map(|m| m.as_array())
        .flatten()
        .filter_map(parse_manifest_entry)
        .collect();

    if entries.is_empty() {
        return Err((Status::BadRequest, Json(serde_json::json!({"error": "no manifests supplied"}))));
    }

    let stored = directory.publish_many(entries);
    Ok(Json(manifests_response_envelope(&envelope.conversation.id, &stored)))
}

#[post("/api/v1/manifests/get", format = "json", data = "<body>")]
pub fn get_manifests(
    directory: &State<AgentDirectory>,
    body: Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let envelope = Envelope::parse(&body).map_err(|e| (Status::BadRequest, Json(serde_json::json!({"error": e.to_string()}))))?;

    let params = envelope
        .events
        .iter()
        .find(|e| e.event_type == EventType::GetManifests)
        .and_then(|e| e.parameters.as_ref());

    let filter = ManifestFilter {
        capabilities: params
            .and_then(|p| p.get("capabilities"))
            .and_then(|c| c.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()),
        organization: params.and_then(|p| p.get("organization")).and_then(|v| v.as_str()).map(str::to_string),
        role: params.and_then(|p| p.get("role")).and_then(|v| v.as_str()).map(str::to_string),
        speaker_uri: params.and_then(|p| p.get("speakerUri")).and_then(|v| v.as_str()).map(str::to_string),
        status: None,
    };

    let matches = directory.get(&filter);
    Ok(Json(manifests_response_envelope(&envelope.conversation.id, &matches)))
}

#[get("/api/v1/manifests/search?<capabilities>&<organization>&<role>&<speaker_uri>")]
pub fn search_manifests(
    directory: &State<AgentDirectory>,
    capabilities: Option<&str>,
    organization: Option<&str>,
    role: Option<&str>,
    speaker_uri: Option<&str>,
) -> Json<serde_json::Value> {
    let filter = ManifestFilter {
        capabilities: capabilities.map(|c| c.split(',').map(str::to_string).collect()),
        organization: organization.map(str::to_string),
        role: role.map(str::to_string),
        speaker_uri: speaker_uri.map(str::to_string),
        status: None,
    };

    let matches = directory.get(&filter);
    Json(serde_json::json!({ "manifests": matches, "count": matches.len() }))
}

#[get("/api/v1/manifests/list")]
pub fn list_manifests(directory: &State<AgentDirectory>) -> Json<serde_json::Value> {
    let matches = directory.get(&ManifestFilter::default());
    Json(serde_json::json!({ "manifests": matches, "count": matches.len() }))
}
