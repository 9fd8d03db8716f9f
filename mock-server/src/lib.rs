use std::{
    collections::{HashMap, VecDeque},
    io::Read,
    sync::Arc,
};

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSetMeta {
    pub name: String,
    pub data_group: String,
    pub data_type: String,
}

#[derive(Deserialize)]
pub struct DataSetFilter {
    #[serde(rename = "data-group")]
    pub data_group: Option<String>,
    #[serde(rename = "data-type")]
    pub data_type: Option<String>,
}

/// A request as the server received it, before any routing.
#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub data_sets: Vec<DataSetMeta>,
    pub records: HashMap<String, Vec<Value>>,
    pub users: HashMap<String, Value>,
    pub collectors: HashMap<String, Value>,
    pub collector_types: HashMap<String, Value>,
    /// Statuses answered, in order, instead of routing the next requests.
    pub faults: VecDeque<u16>,
    pub received: Vec<ReceivedRequest>,
}

impl Store {
    pub fn seeded() -> Self {
        let mut store = Store {
            data_sets: vec![
                DataSetMeta {
                    name: "famous_knights_dragons_killed".to_string(),
                    data_group: "famous-knights".to_string(),
                    data_type: "dragons-killed".to_string(),
                },
                DataSetMeta {
                    name: "carers_allowance_journey".to_string(),
                    data_group: "carers-allowance".to_string(),
                    data_type: "journey".to_string(),
                },
            ],
            ..Store::default()
        };
        store.users.insert(
            "foo@bar.com".to_string(),
            json!({"email": "foo@bar.com", "data_sets": ["famous_knights_dragons_killed"]}),
        );
        store.collectors.insert(
            "ga-journey".to_string(),
            json!({"slug": "ga-journey", "type": "ga", "data_set": "carers_allowance_journey"}),
        );
        store
            .collector_types
            .insert("ga".to_string(), json!({"slug": "ga", "entry_point": "performanceplatform.collector.ga"}));
        store
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn new_db() -> Db {
    Arc::new(RwLock::new(Store::seeded()))
}

pub fn app() -> Router {
    app_with_state(new_db())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route(
            "/data/{group}/{kind}",
            get(read_records).post(append_records).put(replace_records),
        )
        .route("/data-sets", get(list_data_sets))
        .route("/data-sets/{name}", get(get_data_set))
        .route("/users/{email}", get(get_user))
        .route("/collector", get(list_collectors))
        .route("/collector/{name}", get(get_collector))
        .route("/collector-type", get(list_collector_types))
        .route("/collector-type/{name}", get(get_collector_type))
        .layer(middleware::from_fn_with_state(db.clone(), record_and_inject))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

/// Logs every request and answers with the next injected fault, if any.
async fn record_and_inject(State(db): State<Db>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let received = ReceivedRequest {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect(),
        body: bytes.to_vec(),
    };
    tracing::debug!(method = %received.method, uri = %received.uri, "request received");

    let fault = {
        let mut store = db.write().await;
        store.received.push(received);
        store.faults.pop_front()
    };
    if let Some(status) = fault {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "injected fault").into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len())
}

/// Decodes a JSON body, gunzipping it first when the client says so.
pub fn decode_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, StatusCode> {
    let gzipped = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

    if gzipped {
        let mut text = String::new();
        GzDecoder::new(body)
            .read_to_string(&mut text)
            .map_err(|_| StatusCode::BAD_REQUEST)?;
        serde_json::from_str(&text).map_err(|_| StatusCode::BAD_REQUEST)
    } else {
        serde_json::from_slice(body).map_err(|_| StatusCode::BAD_REQUEST)
    }
}

fn with_id(mut record: Value) -> Value {
    if let Some(object) = record.as_object_mut() {
        object
            .entry("_id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    }
    record
}

async fn read_records(State(db): State<Db>, Path((group, kind)): Path<(String, String)>) -> Json<Value> {
    let store = db.read().await;
    let records = store.records.get(&format!("{group}/{kind}")).cloned().unwrap_or_default();
    Json(json!({ "data": records }))
}

async fn append_records(
    State(db): State<Db>,
    Path((group, kind)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    if !is_authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let incoming = match decode_body(&headers, &body)? {
        Value::Array(records) => records,
        record @ Value::Object(_) => vec![record],
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    let mut store = db.write().await;
    store
        .records
        .entry(format!("{group}/{kind}"))
        .or_default()
        .extend(incoming.into_iter().map(with_id));
    Ok(Json(json!({ "status": "ok" })))
}

async fn replace_records(
    State(db): State<Db>,
    Path((group, kind)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    if !is_authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let Value::Array(records) = decode_body(&headers, &body)? else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let mut store = db.write().await;
    store
        .records
        .insert(format!("{group}/{kind}"), records.into_iter().map(with_id).collect());
    Ok(Json(json!({ "status": "ok" })))
}

async fn list_data_sets(State(db): State<Db>, Query(filter): Query<DataSetFilter>) -> Json<Vec<DataSetMeta>> {
    let store = db.read().await;
    let matches = store
        .data_sets
        .iter()
        .filter(|ds| filter.data_group.as_ref().is_none_or(|g| *g == ds.data_group))
        .filter(|ds| filter.data_type.as_ref().is_none_or(|t| *t == ds.data_type))
        .cloned()
        .collect();
    Json(matches)
}

async fn get_data_set(State(db): State<Db>, Path(name): Path<String>) -> Result<Json<DataSetMeta>, StatusCode> {
    let store = db.read().await;
    store
        .data_sets
        .iter()
        .find(|ds| ds.name == name)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_user(State(db): State<Db>, Path(email): Path<String>) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    store.users.get(&email).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_collectors(State(db): State<Db>) -> Json<Vec<Value>> {
    let store = db.read().await;
    Json(store.collectors.values().cloned().collect())
}

async fn get_collector(State(db): State<Db>, Path(name): Path<String>) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    store.collectors.get(&name).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_collector_types(State(db): State<Db>) -> Json<Vec<Value>> {
    let store = db.read().await;
    Json(store.collector_types.values().cloned().collect())
}

async fn get_collector_type(State(db): State<Db>, Path(name): Path<String>) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    store.collector_types.get(&name).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}
