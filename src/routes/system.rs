use rocket::serde::json::Json;
use rocket::{catch, get};

#[get("/api/v1/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "floor-manager",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[catch(404)]
pub fn not_found() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "Not found"}))
}
