use std::io::Write;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use flate2::{write::GzEncoder, Compression};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, new_db, DataSetMeta};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, "Bearer token")
        .body(body.to_string())
        .unwrap()
}

// --- data ---

#[tokio::test]
async fn read_unknown_data_set_is_empty() {
    let resp = app().oneshot(get("/data/nobody/nothing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({ "data": [] }));
}

#[tokio::test]
async fn post_without_token_returns_401() {
    let req = Request::builder()
        .method("POST")
        .uri("/data/famous-knights/dragons-killed")
        .body(r#"[{"count": 1}]"#.to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_malformed_json_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/data/famous-knights/dragons-killed", "[1,"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_requires_an_array() {
    let resp = app()
        .oneshot(json_request("PUT", "/data/famous-knights/dragons-killed", r#"{"a":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gzipped_records_are_stored_decoded() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(br#"[{"count": 7}]"#).unwrap();
    let zipped = encoder.finish().unwrap();

    let db = new_db();
    let req = Request::builder()
        .method("POST")
        .uri("/data/famous-knights/dragons-killed")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::CONTENT_ENCODING, "gzip")
        .header(http::header::AUTHORIZATION, "Bearer token")
        .body(Body::from(zipped))
        .unwrap();
    let resp = app_with_state(db.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let store = db.read().await;
    let records = &store.records["famous-knights/dragons-killed"];
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["count"], 7);
}

#[tokio::test]
async fn write_read_and_empty() {
    let db = new_db();
    let uri = "/data/famous-knights/dragons-killed";

    let resp = app_with_state(db.clone())
        .oneshot(json_request("POST", uri, r#"[{"count": 1}, {"count": 2}]"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "ok");

    let resp = app_with_state(db.clone())
        .oneshot(json_request("POST", uri, r#"{"count": 3}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app_with_state(db.clone()).oneshot(get(uri)).await.unwrap();
    let body: Value = body_json(resp).await;
    let counts: Vec<_> = body["data"].as_array().unwrap().iter().map(|r| r["count"].clone()).collect();
    assert_eq!(counts, vec![json!(1), json!(2), json!(3)]);
    assert!(body["data"][0]["_id"].is_string());

    let resp = app_with_state(db.clone()).oneshot(json_request("PUT", uri, "[]")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app_with_state(db.clone()).oneshot(get(uri)).await.unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({ "data": [] }));
}

// --- admin ---

#[tokio::test]
async fn list_data_sets_filters_by_group_and_type() {
    let resp = app()
        .oneshot(get("/data-sets?data-group=famous-knights&data-type=dragons-killed"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let data_sets: Vec<DataSetMeta> = body_json(resp).await;
    assert_eq!(data_sets.len(), 1);
    assert_eq!(data_sets[0].name, "famous_knights_dragons_killed");
}

#[tokio::test]
async fn list_data_sets_without_filter_returns_all() {
    let resp = app().oneshot(get("/data-sets")).await.unwrap();
    let data_sets: Vec<DataSetMeta> = body_json(resp).await;
    assert_eq!(data_sets.len(), 2);
}

#[tokio::test]
async fn unknown_data_set_returns_404() {
    let resp = app().oneshot(get("/data-sets/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_email_is_percent_decoded() {
    let resp = app().oneshot(get("/users/foo%40bar.com")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = body_json(resp).await;
    assert_eq!(user["email"], "foo@bar.com");
}

// --- collector ---

#[tokio::test]
async fn collectors_and_types() {
    let resp = app().oneshot(get("/collector/ga-journey")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let collector: Value = body_json(resp).await;
    assert_eq!(collector["type"], "ga");

    let resp = app().oneshot(get("/collector-type")).await.unwrap();
    let types: Vec<Value> = body_json(resp).await;
    assert_eq!(types.len(), 1);

    let resp = app().oneshot(get("/collector/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- fault injection and request log ---

#[tokio::test]
async fn injected_faults_are_answered_in_order() {
    let db = new_db();
    db.write().await.faults.extend([502, 503]);

    let first = app_with_state(db.clone()).oneshot(get("/data-sets")).await.unwrap();
    let second = app_with_state(db.clone()).oneshot(get("/data-sets")).await.unwrap();
    let third = app_with_state(db.clone()).oneshot(get("/data-sets")).await.unwrap();

    assert_eq!(first.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_bytes(first).await, "injected fault");
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(third.status(), StatusCode::OK);
}

#[tokio::test]
async fn every_request_is_logged_with_headers_and_body() {
    let db = new_db();
    app_with_state(db.clone())
        .oneshot(json_request("POST", "/data/a/b", r#"[{"x": 1}]"#))
        .await
        .unwrap();

    let store = db.read().await;
    assert_eq!(store.received.len(), 1);
    let received = &store.received[0];
    assert_eq!(received.method, "POST");
    assert_eq!(received.uri, "/data/a/b");
    assert_eq!(received.header("authorization"), Some("Bearer token"));
    assert_eq!(received.body, br#"[{"x": 1}]"#);
}
