#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ovhsync_api::{ApiClient, Endpoint, Error, RestClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/1.0", server.uri())).unwrap();
    let client = RestClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn restrictions() -> Endpoint {
    Endpoint::new("cloud")
        .push("project")
        .push("abc123")
        .push("database")
        .push("postgresql")
        .push("c1")
        .push("ipRestriction")
}

const COLLECTION_PATH: &str = "/1.0/cloud/project/abc123/database/postgresql/c1/ipRestriction";

// ── Success paths ───────────────────────────────────────────────────

#[tokio::test]
async fn test_get_escapes_cidr_segment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{COLLECTION_PATH}/203.0.113.4%2F32")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "203.0.113.4/32",
            "description": "",
            "status": "READY"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body: Value = client
        .get(&restrictions().push("203.0.113.4/32"))
        .await
        .unwrap();

    assert_eq!(body["status"], "READY");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(COLLECTION_PATH))
        .and(body_json(json!({"ip": "198.51.100.0/24", "description": "office"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "198.51.100.0/24",
            "description": "office",
            "status": "CREATING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body: Value = client
        .post(
            &restrictions(),
            &json!({"ip": "198.51.100.0/24", "description": "office"}),
        )
        .await
        .unwrap();

    assert_eq!(body["status"], "CREATING");
}

#[tokio::test]
async fn test_empty_body_decodes_as_null() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{COLLECTION_PATH}/10.0.0.1")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let body: Option<Value> = client
        .delete(&restrictions().push("10.0.0.1"))
        .await
        .unwrap();
    assert!(body.is_none());

    Mock::given(method("PUT"))
        .and(path(format!("{COLLECTION_PATH}/10.0.0.1")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client
        .put::<_, ()>(&restrictions().push("10.0.0.1"), &json!({"description": "x"}))
        .await
        .unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_conflict_is_recognised() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(COLLECTION_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "class": "Client::Conflict",
            "message": "An operation is already in progress on this cluster"
        })))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client
        .post(&restrictions(), &json!({"ip": "10.0.0.1"}))
        .await;

    let err = result.unwrap_err();
    assert!(err.is_conflict(), "expected conflict, got: {err:?}");
    assert_eq!(err.api_class(), Some("Client::Conflict"));
    assert!(err.to_string().contains("already in progress"));
}

#[tokio::test]
async fn test_not_found_with_plain_text_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client.get(&restrictions().push("10.9.9.9")).await;

    match result {
        Err(Error::Api {
            status: 404,
            ref message,
            ..
        }) => assert_eq!(message, "gone"),
        other => panic!("expected 404 Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client.get(&restrictions()).await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => assert_eq!(body, "{not json"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_body_truncated_on_char_boundary() {
    let (server, client) = setup().await;

    // 199 ASCII bytes, then a two-byte 'é' straddling byte 200.
    let page = format!("{}{}", "x".repeat(199), "é".repeat(50));
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string(page))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client.get(&restrictions()).await;

    match result {
        Err(Error::Api {
            status: 503,
            ref message,
            ..
        }) => {
            assert_eq!(message.chars().count(), 200);
            assert!(message.ends_with('é'));
        }
        other => panic!("expected 503 Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_multibyte_body_is_a_deserialization_error() {
    let (server, client) = setup().await;

    let page = format!("<{}{}", "x".repeat(198), "ü".repeat(50));
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page.clone()))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client.get(&restrictions()).await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => assert_eq!(body, &page),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
