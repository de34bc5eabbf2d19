use rocket::http::{ContentType, Status};

use crate::common::test_client;

#[test]
fn test_request_then_release_floor() {
    let client = test_client();

    let res = client
        .post("/api/v1/floor/request")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c1", "speakerUri": "tag:a", "priority": 0}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["granted"], true);
    assert_eq!(body["holder"], "tag:a");

    let res = client
        .post("/api/v1/floor/release")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c1", "speakerUri": "tag:a"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["released"], true);
}

#[test]
fn test_release_by_non_holder_is_bad_request() {
    let client = test_client();

    client
        .post("/api/v1/floor/request")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c2", "speakerUri": "tag:a", "priority": 0}"#)
        .dispatch();

    let res = client
        .post("/api/v1/floor/release")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c2", "speakerUri": "tag:b"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_get_holder_reflects_current_state() {
    let client = test_client();

    client
        .post("/api/v1/floor/request")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c3", "speakerUri": "tag:a", "priority": 0}"#)
        .dispatch();

    let res = client.get("/api/v1/floor/holder/c3").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["holder"], "tag:a");
    assert_eq!(body["has_floor"], true);
    assert_eq!(body["floorGranted"], serde_json::json!(["tag:a"]));
}

#[test]
fn test_get_holder_idle_conversation() {
    let client = test_client();
    let res = client.get("/api/v1/floor/holder/unused-conversation").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["holder"].is_null());
    assert_eq!(body["has_floor"], false);
}

#[test]
fn test_priority_queue_ordering_via_http() {
    let client = test_client();

    client
        .post("/api/v1/floor/request")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c4", "speakerUri": "tag:a", "priority": 5}"#)
        .dispatch();
    client
        .post("/api/v1/floor/request")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c4", "speakerUri": "tag:b", "priority": 3}"#)
        .dispatch();
    client
        .post("/api/v1/floor/request")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c4", "speakerUri": "tag:c", "priority": 7}"#)
        .dispatch();

    client
        .post("/api/v1/floor/release")
        .header(ContentType::JSON)
        .body(r#"{"conversation_id": "c4", "speakerUri": "tag:a"}"#)
        .dispatch();

    let res = client.get("/api/v1/floor/holder/c4").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["holder"], "tag:c");
}
