//! Integration tests for pnrs-relay API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - POST /investigation/:invest_id/numbers (transfer)
//! - GET /investigation/:invest_id/numbers (query, 404 when empty)

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use pnrs_common::db::connect_in_memory;
use pnrs_common::{Collection, CollectionRole, Document, PersonRecord};
use pnrs_relay::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: in-memory collections, source seeded with two people
async fn setup_state() -> AppState {
    let (state, _) = setup_state_with_destination_pool().await;
    state
}

/// Test helper: as [`setup_state`], also handing back the destination pool
async fn setup_state_with_destination_pool() -> (AppState, SqlitePool) {
    let source = Collection::create(
        connect_in_memory().await.unwrap(),
        "phones",
        CollectionRole::Source,
    )
    .await
    .unwrap();
    let destination_pool = connect_in_memory().await.unwrap();
    let destination = Collection::open(
        destination_pool.clone(),
        "numbers",
        CollectionRole::Destination,
    )
    .await
    .unwrap();

    for (phone, first_name, age) in [("+1 555 0100", "Ann", None), ("+1 555 0101", "Bob", Some(40))] {
        let record = PersonRecord {
            first_name: Some(first_name.to_string()),
            last_name: Some("Lee".to_string()),
            age,
            ..PersonRecord::new(phone)
        };
        source
            .insert(&Document::from_record(&record).unwrap())
            .await
            .unwrap();
    }

    (AppState::new(source, destination), destination_pool)
}

/// Test helper: Create GET request
fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Create POST request with JSON body
fn post_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(setup_state().await);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "pnrs-relay");
    assert!(body["version"].is_string());

    let collections = body["collections"].as_array().expect("Should list collections");
    assert_eq!(collections.len(), 2);
    assert_eq!(
        collections[0],
        json!({"name": "phones", "role": "source", "documents": 2})
    );
    assert_eq!(
        collections[1],
        json!({"name": "numbers", "role": "destination", "documents": 0})
    );
}

#[tokio::test]
async fn test_health_endpoint_degraded_when_store_unavailable() {
    let (state, destination_pool) = setup_state_with_destination_pool().await;
    let app = build_router(state);

    destination_pool.close().await;

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "degraded");

    let collections = body["collections"].as_array().unwrap();
    assert_eq!(collections[0]["documents"], 2);
    assert!(collections[0].get("error").is_none());
    assert_eq!(collections[1]["role"], "destination");
    assert!(collections[1]["error"].is_string());
    assert!(collections[1].get("documents").is_none());
}

// =============================================================================
// Transfer Tests
// =============================================================================

#[tokio::test]
async fn test_transfer_endpoint_reports_counts() {
    let app = build_router(setup_state().await);

    let request = post_request(
        "/investigation/INV-1/numbers",
        json!({"phone_numbers": ["+1 555 0100", "+1 555 0101", "+9 999 9999"]}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Data moved successfully.");
    assert_eq!(body["matched"], 2);
    assert_eq!(body["moved"], 2);
    assert_eq!(body["skipped"], 0);
}

#[tokio::test]
async fn test_transfer_endpoint_missing_list_is_empty_transfer() {
    let app = build_router(setup_state().await);

    let response = app
        .oneshot(post_request("/investigation/INV-1/numbers", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["moved"], 0);
}

#[tokio::test]
async fn test_transfer_endpoint_rejects_malformed_body() {
    let app = build_router(setup_state().await);

    let request = Request::builder()
        .method("POST")
        .uri("/investigation/INV-1/numbers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

// =============================================================================
// Query Tests
// =============================================================================

#[tokio::test]
async fn test_query_unknown_investigation_returns_404() {
    let app = build_router(setup_state().await);

    let response = app
        .oneshot(get_request("/investigation/NO-SUCH-ID/numbers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No records found for this investigation ID.");
}

#[tokio::test]
async fn test_transfer_then_query() {
    let app = build_router(setup_state().await);

    let response = app
        .clone()
        .oneshot(post_request(
            "/investigation/INV-1/numbers",
            json!({"phone_numbers": ["+1 555 0100"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/investigation/INV-1/numbers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let items = body.as_array().expect("Should be a JSON array");
    assert_eq!(items.len(), 1);

    let item = &items[0];
    assert!(item["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(item["first_name"], "Ann");
    assert_eq!(item["last_name"], "Lee");
    assert!(item["age"].is_null());
    assert_eq!(item["email"], "");
    assert_eq!(item["gender"], "");
    assert_eq!(item["phone"], "+1 555 0100");
    assert_eq!(item["invest_id"], "INV-1");
}

#[tokio::test]
async fn test_second_investigation_does_not_retag() {
    let app = build_router(setup_state().await);
    let body = json!({"phone_numbers": ["+1 555 0101"]});

    app.clone()
        .oneshot(post_request("/investigation/INV-A/numbers", body.clone()))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post_request("/investigation/INV-B/numbers", body))
        .await
        .unwrap();
    let report = extract_json(response.into_body()).await;
    assert_eq!(report["moved"], 0);
    assert_eq!(report["skipped"], 1);

    let response = app
        .clone()
        .oneshot(get_request("/investigation/INV-B/numbers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_request("/investigation/INV-A/numbers"))
        .await
        .unwrap();
    let items = extract_json(response.into_body()).await;
    assert_eq!(items[0]["age"], 40);
    assert_eq!(items[0]["invest_id"], "INV-A");
}
