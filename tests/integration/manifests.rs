use rocket::http::{ContentType, Status};

use crate::common::test_client;

fn publish_body(speaker_uri: &str, capabilities: &[&str]) -> String {
    serde_json::json!({
        "openFloor": {
            "schema": {"version": "1.1.0"},
            "conversation": {"id": "directory"},
            "sender": {"speakerUri": speaker_uri},
            "events": [{
                "eventType": "publishManifests",
                "parameters": {
                    "manifests": [{
                        "identification": {"speakerUri": speaker_uri},
                        "capabilities": capabilities
                    }]
                }
            }]
        }
    })
    .to_string()
}

#[test]
fn test_publish_then_search_by_capability() {
    let client = test_client();

    let res = client
        .post("/api/v1/manifests/publish")
        .header(ContentType::JSON)
        .body(publish_body("tag:translator", &["translation", "text"]))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["openFloor"]["events"][0]["parameters"]["count"], 1);

    client
        .post("/api/v1/manifests/publish")
        .header(ContentType::JSON)
        .body(publish_body("tag:texter", &["text"]))
        .dispatch();

    let res = client.get("/api/v1/manifests/search?capabilities=translation").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["manifests"][0]["identification"]["speakerUri"], "tag:translator");
}

#[test]
fn test_list_manifests_returns_all_active() {
    let client = test_client();

    client
        .post("/api/v1/manifests/publish")
        .header(ContentType::JSON)
        .body(publish_body("tag:a", &[]))
        .dispatch();
    client
        .post("/api/v1/manifests/publish")
        .header(ContentType::JSON)
        .body(publish_body("tag:b", &[]))
        .dispatch();

    let res = client.get("/api/v1/manifests/list").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 2);
}

#[test]
fn test_publish_upsert_preserves_published_at() {
    let client = test_client();

    let first = client
        .post("/api/v1/manifests/publish")
        .header(ContentType::JSON)
        .body(publish_body("tag:a", &["text"]))
        .dispatch()
        .into_json::<serde_json::Value>()
        .unwrap();
    let first_published_at = first["openFloor"]["events"][0]["parameters"]["manifests"][0]["publishedAt"].clone();

    let second = client
        .post("/api/v1/manifests/publish")
        .header(ContentType::JSON)
        .body(publish_body("tag:a", &["text", "audio"]))
        .dispatch()
        .into_json::<serde_json::Value>()
        .unwrap();
    let second_published_at = second["openFloor"]["events"][0]["parameters"]["manifests"][0]["publishedAt"].clone();

    assert_eq!(first_published_at, second_published_at);

    let res = client.get("/api/v1/manifests/list").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 1);
}

#[test]
fn test_get_manifests_via_envelope() {
    let client = test_client();

    client
        .post("/api/v1/manifests/publish")
        .header(ContentType::JSON)
        .body(publish_body("tag:a", &["translation"]))
        .dispatch();

    let query = serde_json::json!({
        "openFloor": {
            "schema": {"version": "1.1.0"},
            "conversation": {"id": "directory"},
            "sender": {"speakerUri": "tag:requester"},
            "events": [{"eventType": "getManifests", "parameters": {"capabilities": ["translation"]}}]
        }
    });

    let res = client
        .post("/api/v1/manifests/get")
        .header(ContentType::JSON)
        .body(query.to_string())
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["openFloor"]["events"][0]["parameters"]["count"], 1);
}
