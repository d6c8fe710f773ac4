//! Replays started over HTTP, observed through the progress stream.

use axum::http::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::fixtures::{get, read_sse_frames, TestApp};

const COLLECTOR_PATH: &str = "/services/collector/event";

async fn collector(status: u16, expected: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COLLECTOR_PATH))
        .and(header("authorization", "Splunk ingest-token"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected)
        .mount(&server)
        .await;
    server
}

fn start_body(scenario: &str, server: &MockServer) -> Value {
    json!({
        "scenario_identifier": scenario,
        "ingestion_endpoint": format!("{}{}", server.uri(), COLLECTOR_PATH),
        "ingestion_token": "ingest-token",
    })
}

async fn start(app: &TestApp, body: Value) -> String {
    let (status, ack) = app.post_json("/api/replay", body).await;
    assert_eq!(status, StatusCode::OK, "start failed: {ack}");
    assert_eq!(ack["message"], "Replay started successfully");
    ack["replay_id"].as_str().unwrap().to_string()
}

async fn progress(app: &TestApp, id: &str) -> Vec<Value> {
    let response = app.request(get(&format!("/api/replay/{id}/progress"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    read_sse_frames(response).await
}

#[tokio::test]
async fn streams_one_frame_per_record_then_summary() {
    let sink = collector(200, 3).await;
    let app = TestApp::new();
    app.seed_scenario("burst", &[0, -100, -250]);

    let before = relay::util::now_ms();
    let id = start(&app, start_body("burst", &sink)).await;
    let frames = progress(&app, &id).await;

    assert_eq!(frames.len(), 4);
    for (i, frame) in frames[..3].iter().enumerate() {
        assert_eq!(frame["rec"], i + 1);
        assert_eq!(frame["total"], 3);
        assert!(frame["timestamp"].as_i64().unwrap() >= before);
    }
    let t0 = frames[0]["timestamp"].as_i64().unwrap();
    assert_eq!(frames[1]["timestamp"].as_i64().unwrap() - t0, 100);
    assert_eq!(frames[2]["timestamp"].as_i64().unwrap() - t0, 250);
    assert_eq!(
        frames[3],
        json!({"status": "completed", "delivered": 3, "failed": 0, "total": 3})
    );

    let (status, snapshot) = app.get_json(&format!("/api/replay/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["state"], "completed");
    assert_eq!(snapshot["delivered"], 3);
    assert_eq!(snapshot["scenario"], "burst");
}

#[tokio::test]
async fn delivered_events_carry_rewritten_timestamps() {
    let sink = collector(200, 2).await;
    let app = TestApp::new();
    app.seed_scenario("pair", &[0, 5_000]);

    let id = start(&app, start_body("pair", &sink)).await;
    let frames = progress(&app, &id).await;

    let received = sink.received_requests().await.unwrap();
    let stamps: Vec<i64> = received
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["@timestamp"].as_i64().unwrap())
        .collect();

    // A positive offset would land before the start and is clamped to it.
    assert_eq!(stamps[0], stamps[1]);
    assert_eq!(frames[0]["timestamp"], frames[1]["timestamp"]);
    let seqs: Vec<Value> = received
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["seq"].clone())
        .collect();
    assert_eq!(seqs, vec![json!(0), json!(1)]);
}

#[tokio::test]
async fn failed_deliveries_are_counted_not_fatal() {
    let sink = collector(503, 3).await;
    let app = TestApp::new();
    app.seed_scenario("down", &[0, 0, 0]);

    let id = start(&app, start_body("down", &sink)).await;
    let frames = progress(&app, &id).await;

    assert_eq!(
        frames,
        vec![json!({"status": "completed", "delivered": 0, "failed": 3, "total": 3})]
    );
}

#[tokio::test]
async fn accepts_legacy_field_names() {
    let sink = collector(200, 1).await;
    let app = TestApp::new();
    app.seed_scenario("legacy", &[0]);

    let body = json!({
        "scenario_name": "legacy",
        "hec_url": format!("{}{}", sink.uri(), COLLECTOR_PATH),
        "hec_token": "ingest-token",
    });
    let id = start(&app, body).await;
    assert_eq!(progress(&app, &id).await.len(), 2);
}

#[tokio::test]
async fn concurrent_replays_each_get_their_own_stream() {
    let sink = collector(200, 5).await;
    let app = TestApp::new();
    app.seed_scenario("a", &[0, -1]);
    app.seed_scenario("b", &[0, -1, -2]);

    let a = start(&app, start_body("a", &sink)).await;
    let b = start(&app, start_body("b", &sink)).await;
    assert_ne!(a, b);

    let (frames_a, frames_b) = tokio::join!(progress(&app, &a), progress(&app, &b));

    assert_eq!(frames_a.len(), 3);
    assert_eq!(frames_b.len(), 4);
    assert_eq!(frames_a[2]["total"], 2);
    assert_eq!(frames_b[3]["total"], 3);
}

#[tokio::test]
async fn progress_has_a_single_observer() {
    let sink = collector(200, 1).await;
    let app = TestApp::new();
    app.seed_scenario("solo", &[0]);

    let id = start(&app, start_body("solo", &sink)).await;
    let first = app.request(get(&format!("/api/replay/{id}/progress"))).await;
    assert_eq!(first.status(), StatusCode::OK);

    let (status, _) = app.get_json(&format!("/api/replay/{id}/progress")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(read_sse_frames(first).await.len(), 2);
}

#[tokio::test]
async fn replays_over_the_limit_are_rejected_until_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut config = relay::Config::default();
    config.replay.max_concurrent = 1;
    let app = TestApp::with_config(config);
    app.seed_scenario("long", &[0, 0, 0, 0]);
    app.seed_scenario("short", &[0]);

    // Without an observer the first replay stalls on its second frame.
    let first = start(&app, start_body("long", &server)).await;
    let (status, body) = app.post_json("/api/replay", start_body("short", &server)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = app
        .post_json(&format!("/api/replay/{first}/cancel"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let frames = progress(&app, &first).await;
    assert!(frames.len() < 5);

    let (_, health) = app.get_json("/api/health").await;
    assert_eq!(health["active_replays"], 0);

    let second = start(&app, start_body("short", &server)).await;
    assert_eq!(progress(&app, &second).await.len(), 2);
}
