use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::Deserialize;

use crate::manager::FloorManager;

#[derive(Deserialize)]
pub struct RequestFloorBody {
    conversation_id: String,
    #[serde(rename = "speakerUri")]
    speaker_uri: String,
    #[serde(default)]
    priority: i64,
}

#[post("/api/v1/floor/request", format = "json", data = "<body>")]
pub fn request_floor(manager: &State<FloorManager>, body: Json<RequestFloorBody>) -> Json<serde_json::Value> {
    let granted = manager.floor_control.request_floor(&body.conversation_id, &body.speaker_uri, body.priority);
    let holder = manager.floor_control.get_holder(&body.conversation_id);

    Json(serde_json::json!({
        "conversation_id": body.conversation_id,
        "granted": granted,
        "holder": holder
    }))
}

#[derive(Deserialize)]
pub struct ReleaseFloorBody {
    conversation_id: String,
    #[serde(rename = "speakerUri")]
    speaker_uri: String,
}

#[post("/api/v1/floor/release", format = "json", data = "<body>")]
pub fn release_floor(
    manager: &State<FloorManager>,
    body: Json<ReleaseFloorBody>,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let released = manager.floor_control.yield_floor(&body.conversation_id, &body.speaker_uri);
    if released {
        Ok(Json(serde_json::json!({"released": true})))
    } else {
        Err((Status::BadRequest, Json(serde_json::json!({"released": false, "error": "not the current holder"}))))
    }
}

#[get("/api/v1/floor/holder/<conversation_id>")]
pub fn get_holder(manager: &State<FloorManager>, conversation_id: &str) -> Json<serde_json::Value> {
    let holder = manager.floor_control.get_holder(conversation_id);
    let metadata = manager.floor_control.get_metadata(conversation_id);

    Json(serde_json::json!({
        "conversation_id": conversation_id,
        "holder": holder,
        "has_floor": !metadata.floor_granted.is_empty(),
        "assignedFloorRoles": metadata.assigned_floor_roles,
        "floorGranted": metadata.floor_granted
    }))
}
