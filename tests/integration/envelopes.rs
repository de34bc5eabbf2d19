use rocket::http::{ContentType, Status};

use crate::common::test_client;

#[test]
fn test_send_envelope_round_trip() {
    let client = test_client();
    let body = serde_json::json!({
        "envelope": {
            "openFloor": {
                "schema": {"version": "1.1.0"},
                "conversation": {"id": "conv-1"},
                "sender": {"speakerUri": "tag:a"},
                "events": [{"eventType": "context"}]
            }
        }
    });

    let res = client
        .post("/api/v1/envelopes/send")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let resp: serde_json::Value = res.into_json().unwrap();
    assert_eq!(resp["conversation_id"], "conv-1");
    assert_eq!(resp["events_processed"], 1);
}

#[test]
fn test_send_malformed_envelope_is_bad_request() {
    let client = test_client();
    let body = serde_json::json!({ "envelope": { "openFloor": { "events": [] } } });

    let res = client
        .post("/api/v1/envelopes/send")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_validate_envelope_valid() {
    let client = test_client();
    let doc = serde_json::json!({
        "openFloor": {
            "schema": {"version": "1.1.0"},
            "conversation": {"id": "conv-2"},
            "sender": {"speakerUri": "tag:a"},
            "events": [{"eventType": "utterance"}]
        }
    });

    let res = client
        .post("/api/v1/envelopes/validate")
        .header(ContentType::JSON)
        .body(doc.to_string())
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let resp: serde_json::Value = res.into_json().unwrap();
    assert_eq!(resp["valid"], true);
    assert_eq!(resp["conversation_id"], "conv-2");
}

#[test]
fn test_validate_envelope_invalid() {
    let client = test_client();
    let doc = serde_json::json!({"openFloor": {"events": []}});

    let res = client
        .post("/api/v1/envelopes/validate")
        .header(ContentType::JSON)
        .body(doc.to_string())
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let resp: serde_json::Value = res.into_json().unwrap();
    assert_eq!(resp["valid"], false);
    assert!(resp["error"].is_string());
}

#[test]
fn test_send_utterance_builds_and_returns_envelope() {
    let client = test_client();
    let body = serde_json::json!({
        "conversation_id": "conv-3",
        "sender_speakerUri": "tag:a",
        "target_speakerUri": "tag:b",
        "text": "hello there",
        "private": true
    });

    let res = client
        .post("/api/v1/envelopes/utterance")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let resp: serde_json::Value = res.into_json().unwrap();
    assert_eq!(resp["success"], true);
    assert_eq!(resp["conversation_id"], "conv-3");
    assert_eq!(resp["envelope"]["openFloor"]["sender"]["speakerUri"], "tag:a");
}

#[test]
fn test_send_utterance_rejects_empty_text() {
    let client = test_client();
    let body = serde_json::json!({
        "conversation_id": "conv-4",
        "sender_speakerUri": "tag:a",
        "text": "   "
    });

    let res = client
        .post("/api/v1/envelopes/utterance")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}
