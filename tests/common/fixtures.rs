//! Fixtures for driving the relay service end to end.

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use relay::config::Config;
use relay::scenario::{Scenario, ScenarioStore};
use relay::web::{build_router, WebAppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// One search hit whose `_source` carries `@timestamp` plus `fields`.
pub fn hit(id: &str, ts: i64, fields: Value) -> Value {
    let mut source = json!({ "@timestamp": ts });
    if let (Some(source), Some(extra)) = (source.as_object_mut(), fields.as_object()) {
        for (k, v) in extra {
            source.insert(k.clone(), v.clone());
        }
    }
    json!({ "_id": id, "_source": source })
}

/// A search API response wrapping `hits` in `response.hits.hits`.
pub fn search_response(hits: Vec<Value>) -> Value {
    json!({ "response": { "hits": { "total": hits.len(), "hits": hits } } })
}

/// Web app over a private data directory.
pub struct TestApp {
    pub state: WebAppState,
    pub dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let dir = tempfile::Builder::new()
            .prefix("relay-it-")
            .tempdir()
            .expect("temp data dir");
        let store = ScenarioStore::new(dir.path().join("scenarios"));
        let state = WebAppState::new(config, store).expect("web state");
        Self { state, dir }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn store(&self) -> &ScenarioStore {
        self.state.store()
    }

    /// Store a scenario with the given offsets, one record per offset.
    pub fn seed_scenario(&self, name: &str, offsets: &[i64]) {
        let events: Vec<Value> = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| json!({ "@timestamp": offset, "seq": i }))
            .collect();
        let bytes = serde_json::to_vec(&events).expect("encode scenario");
        let scenario = Scenario::from_slice(&bytes).expect("scenario");
        self.store()
            .save(name, &scenario, false)
            .expect("seed scenario");
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.expect("router call")
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        read_json(self.request(get(uri)).await).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        read_json(self.request(post(uri, body)).await).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Every `data:` payload in an event-stream body, in order.
pub async fn read_sse_frames(response: Response<Body>) -> Vec<Value> {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("utf-8 event stream");
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).expect("frame json"))
        .collect()
}
