use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{post, State};
use serde::Deserialize;

use crate::envelope::Envelope;
use crate::manager::FloorManager;

#[derive(Deserialize)]
pub struct SendEnvelopeBody {
    envelope: serde_json::Value,
}

#[post("/api/v1/envelopes/send", format = "json", data = "<body>")]
pub async fn send_envelope(
    manager: &State<FloorManager>,
    body: Json<SendEnvelopeBody>,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let envelope = Envelope::parse(&body.envelope).map_err(|e| {
        (Status::BadRequest, Json(serde_json::json!({"error": e.to_string()})))
    })?;

    let events_processed = envelope.events.len();
    let success = manager.process_envelope(&envelope).await;

    Ok(Json(serde_json::json!({
        "success": success,
        "conversation_id": envelope.conversation.id,
        "events_processed": events_processed
    })))
}

#[derive(Deserialize)]
pub struct UtteranceBody {
    conversation_id: String,
    #[serde(rename = "sender_speakerUri")]
    sender_speaker_uri: String,
    #[serde(rename = "sender_serviceUrl")]
    #[allow(dead_code)]
    sender_service_url: Option<String>,
    #[serde(rename = "target_speakerUri")]
    target_speaker_uri: Option<String>,
    #[serde(rename = "target_serviceUrl")]
    #[allow(dead_code)]
    target_service_url: Option<String>,
    text: String,
    private: Option<bool>,
}

#[post("/api/v1/envelopes/utterance", format = "json", data = "<body>")]
pub async fn send_utterance(
    manager: &State<FloorManager>,
    body: Json<UtteranceBody>,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err((Status::BadRequest, Json(serde_json::json!({"error": "text must not be empty"}))));
    }

    let envelope = manager
        .send_utterance(
            &body.conversation_id,
            &body.sender_speaker_uri,
            body.target_speaker_uri.as_deref(),
            text,
            body.private.unwrap_or(false),
        )
        .await;

    Ok(Json(serde_json::json!({
        "success": true,
        "conversation_id": envelope.conversation.id,
        "envelope": envelope.to_document()
    })))
}

#[post("/api/v1/envelopes/validate", format = "json", data = "<body>")]
pub fn validate_envelope(body: Json<serde_json::Value>) -> Json<serde_json::Value> {
    match Envelope::parse(&body) {
        Ok(envelope) => Json(serde_json::json!({
            "valid": true,
            "version": envelope.schema.version,
            "conversation_id": envelope.conversation.id
        })),
        Err(e) => Json(serde_json::json!({
            "valid": false,
            "error": e.to_string()
        })),
    }
}
