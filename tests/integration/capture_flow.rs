//! Search, sanitize and capture through the HTTP API.

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::fixtures::{hit, search_response, TestApp};

const SEARCH_PATH: &str = "/api/ds/get_index_zoom_histogram_lv3";

async fn search_server(body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("fluencytoken", "search-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn search_body(server: &MockServer) -> serde_json::Value {
    json!({
        "searchString": "login failed",
        "startTime": 1_000,
        "endTime": 9_000,
        "site": server.uri(),
        "token": "search-token",
    })
}

#[tokio::test]
async fn fetch_returns_sanitized_hits_in_order() {
    let server = search_server(search_response(vec![
        hit("1", 1_000, json!({"host": "db.acme.internal", "password": "hunter2"})),
        hit("2", 2_000, json!({"nested": [{"password": "x", "note": "acme"}]})),
    ]))
    .await;

    let app = TestApp::new();
    let mut body = search_body(&server);
    body["rules"] = json!({
        "replace": [{"find": "acme", "replace": "example"}],
        "drop": ["password"]
    });

    let (status, hits) = app.post_json("/api/search", body).await;

    assert_eq!(status, StatusCode::OK);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["_source"]["host"], "db.example.internal");
    assert!(hits[0]["_source"].get("password").is_none());
    assert_eq!(hits[1]["_source"]["nested"][0], json!({"note": "example"}));
}

#[tokio::test]
async fn fetch_forwards_window_and_grid_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(query_param("gridaccount", "tenant-7"))
        .and(body_partial_json(json!({
            "kargs": {"options": {"searchStr": "login failed", "range_from": 1_000, "range_to": 9_000}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::new();
    let mut body = search_body(&server);
    body["gridAccount"] = json!("tenant-7");

    let (status, hits) = app.post_json("/api/search", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits, json!([]));
}

#[tokio::test]
async fn missing_hit_nesting_is_an_empty_result() {
    let server = search_server(json!({"response": {"total": 0}})).await;
    let app = TestApp::new();

    let (status, hits) = app.post_json("/api/search", search_body(&server)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits, json!([]));
}

#[tokio::test]
async fn upstream_failure_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;
    let app = TestApp::new();

    let (status, body) = app.post_json("/api/search", search_body(&server)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch remote");
}

#[tokio::test]
async fn empty_token_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = TestApp::new();
    let mut body = search_body(&server);
    body["token"] = json!("");

    let (status, body) = app.post_json("/api/search", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("token"));
}

#[tokio::test]
async fn capture_stores_offsets_and_skips_unusable_hits() {
    let server = search_server(search_response(vec![
        hit("1", 10_000, json!({"src_ip": "10.1.2.3"})),
        json!({"_id": "broken", "_source": "not an object"}),
        hit("2", 10_400, json!({"src_ip": "192.168.7.9"})),
        hit("3", 12_000, json!({})),
    ]))
    .await;

    let mut config = relay::Config::default();
    config.sanitize = relay::SanitizationRules::default().with_ip_obfuscate("src_ip");
    let app = TestApp::with_config(config);

    let mut body = search_body(&server);
    body["name"] = json!("login-burst");

    let (status, created) = app.post_json("/api/scenarios", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        created,
        json!({"name": "login-burst", "records": 3, "skipped": 1, "origin": 10_000})
    );

    let (status, artifact) = app.get_json("/api/scenarios/login-burst").await;
    assert_eq!(status, StatusCode::OK);
    let offsets: Vec<i64> = artifact
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["@timestamp"].as_i64().unwrap())
        .collect();
    assert_eq!(offsets, vec![0, -400, -2_000]);
    assert_eq!(artifact[0]["src_ip"], "10.x.x.x");
    assert_eq!(artifact[1]["src_ip"], "192.x.x.x");

    let on_disk = std::fs::read_to_string(app.store().path_for("login-burst").unwrap()).unwrap();
    assert!(on_disk.starts_with("[\n  {"));

    let (_, listing) = app.get_json("/api/scenarios").await;
    assert_eq!(listing["scenarios"][0]["name"], "login-burst");
    assert_eq!(listing["scenarios"][0]["records"], 3);
}

#[tokio::test]
async fn capture_overwrite_replaces_existing_scenario() {
    let server = search_server(search_response(vec![hit("1", 5, json!({}))])).await;
    let app = TestApp::new();
    app.seed_scenario("again", &[0, -1, -2]);

    let mut body = search_body(&server);
    body["name"] = json!("again");

    let (status, _) = app.post_json("/api/scenarios", body.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    body["overwrite"] = json!(true);
    let (status, created) = app.post_json("/api/scenarios", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["records"], 1);
    assert_eq!(app.store().load("again").unwrap().len(), 1);
}
