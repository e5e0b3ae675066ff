//! Handler tests for the directory domain
//!
//! These drive the user router directly with in-memory partitions:
//! - Request deserialization and validation
//! - Response serialization
//! - HTTP status codes for every outcome, including partition outages

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_directory::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

struct Harness {
    a: InMemoryPartitionStore,
    b: InMemoryPartitionStore,
    app: Router,
}

/// Router over two in-memory partitions; the stores stay reachable for
/// seeding and outage simulation.
fn harness(strategy: PlacementStrategy) -> Harness {
    let a = InMemoryPartitionStore::new();
    let b = InMemoryPartitionStore::new();
    let coordinator =
        DirectoryCoordinator::new(a.clone(), b.clone()).with_placement(strategy.into_policy());

    Harness {
        a,
        b,
        app: handlers::router(coordinator),
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_create_returns_201_with_partition_and_id() {
    let h = harness(PlacementStrategy::A);

    let (status, body) = send(
        &h.app,
        "POST",
        "/",
        Some(json!({"username": "alice", "email": "alice@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["partition"], "A");
    assert_eq!(h.a.scan_all().await.unwrap().len(), 1);
    assert!(h.b.scan_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_respects_configured_placement() {
    let h = harness(PlacementStrategy::B);

    let (status, body) = send(
        &h.app,
        "POST",
        "/",
        Some(json!({"username": "bob", "email": "bob@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["partition"], "B");
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let h = harness(PlacementStrategy::A);

    let cases = [
        json!({"username": "", "email": "alice@example.com"}),
        json!({"username": "   ", "email": "alice@example.com"}),
        json!({"username": "al\u{0}ice", "email": "alice@example.com"}),
        json!({"username": "alice", "email": "not-an-email"}),
        json!({"email": "alice@example.com"}),
    ];

    for payload in cases {
        let (status, body) = send(&h.app, "POST", "/", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert!(body["code"].is_number());
    }

    let (status, body) = send(
        &h.app,
        "POST",
        "/",
        Some(json!({"username": "alice", "email": "bad"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"]["email"].is_array());

    assert!(h.a.scan_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let h = harness(PlacementStrategy::A);

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_returns_a_then_b() {
    let h = harness(PlacementStrategy::A);
    h.b.insert(UserInput::new("bob", "bob@example.com"))
        .await
        .unwrap();
    h.a.insert(UserInput::new("alice", "alice@example.com"))
        .await
        .unwrap();

    let (status, body) = send(&h.app, "GET", "/", None).await;

    assert_eq!(status, StatusCode::OK);
    let users: Vec<User> = serde_json::from_value(body).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].username, "alice");
    assert_eq!(users[1].username, "bob");
    assert_eq!(users[0].id, users[1].id);
}

#[tokio::test]
async fn test_list_fails_when_a_partition_is_down() {
    let h = harness(PlacementStrategy::A);
    h.a.insert(UserInput::new("alice", "alice@example.com"))
        .await
        .unwrap();
    h.b.set_available(false);

    let (status, body) = send(&h.app, "GET", "/", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "INTERNAL_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("offline"));
}

#[tokio::test]
async fn test_update_reports_owning_partition() {
    let h = harness(PlacementStrategy::A);
    h.b.insert(UserInput::new("bob", "bob@example.com"))
        .await
        .unwrap();

    let (status, body) = send(
        &h.app,
        "PUT",
        "/1",
        Some(json!({"username": "bob2", "email": "bob2@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedIn"], "B");
    assert!(body["message"].is_string());
    assert_eq!(h.b.scan_all().await.unwrap()[0].username, "bob2");
}

#[tokio::test]
async fn test_update_missing_id_returns_404() {
    let h = harness(PlacementStrategy::A);

    let (status, body) = send(
        &h.app,
        "PUT",
        "/42",
        Some(json!({"username": "ghost", "email": "ghost@example.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_bad_ids_return_400() {
    let h = harness(PlacementStrategy::A);

    for uri in ["/abc", "/0", "/-1", "/99999999999"] {
        let (status, body) = send(&h.app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
        assert_eq!(body["error"], "INVALID_ID");
    }

    let (status, _) = send(
        &h.app,
        "PUT",
        "/abc",
        Some(json!({"username": "alice", "email": "alice@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_falls_back_then_404() {
    let h = harness(PlacementStrategy::A);
    h.a.insert(UserInput::new("alice", "alice@example.com"))
        .await
        .unwrap();

    let (status, body) = send(&h.app, "DELETE", "/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedFrom"], "A");

    let (status, _) = send(&h.app, "DELETE", "/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_outage_in_a_blocks_fallback_to_b() {
    let h = harness(PlacementStrategy::A);
    h.b.insert(UserInput::new("bob", "bob@example.com"))
        .await
        .unwrap();
    h.a.set_available(false);

    let (status, _) = send(&h.app, "DELETE", "/1", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.b.scan_all().await.unwrap().len(), 1);
}
