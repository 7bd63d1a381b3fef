// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /ingest -> GET /insights round trip
// - GET /actions
// - GET /debug/pipeline
// - malformed ingest payloads

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use community_insights::api::{create_router, AppState};
use community_insights::extract::{DynExtractor, MockExtractor};
use community_insights::identity::IdentityCache;
use community_insights::model::{Insight, Severity};
use community_insights::pipeline::InsightPipeline;
use tempfile::TempDir;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Build the same Router the binary uses, backed by a mock extractor.
fn test_router(mock: Arc<MockExtractor>) -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = InsightPipeline::new(
        mock as DynExtractor,
        IdentityCache::new(dir.path().join("ingested.json")),
    );
    (create_router(AppState { pipeline }), dir)
}

async fn read_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json body")
}

fn post_json(uri: &str, payload: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let (app, _dir) = test_router(Arc::new(MockExtractor::new()));

    let resp = app.oneshot(get("/health")).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "ok");
}

#[tokio::test]
async fn api_ingest_then_insights_round_trip() {
    let mock = Arc::new(MockExtractor::new());
    mock.respond(
        "Tab crashes when config is empty",
        Insight {
            category: "stability".to_string(),
            summary: "Empty config crashes the tab".to_string(),
            severity: Severity::High,
        },
    );
    let (app, _dir) = test_router(mock);

    let payload = json!([{
        "id": "gh-7",
        "source": "github",
        "url": "https://github.com/acme/widget/issues/7",
        "text": "Tab crashes when config is empty",
        "created_at": "2026-08-05T12:00:00Z"
    }]);
    let resp = app
        .clone()
        .oneshot(post_json("/ingest", &payload))
        .await
        .expect("oneshot /ingest");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["accepted"], json!(1));

    let resp = app
        .clone()
        .oneshot(get("/insights"))
        .await
        .expect("oneshot /insights");
    assert_eq!(resp.status(), StatusCode::OK);
    let arr = read_json(resp).await;
    let entries = arr.as_array().expect("insights is an array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], json!("gh-7"));
    assert_eq!(entries[0]["summary"], json!("Empty config crashes the tab"));
    assert_eq!(entries[0]["severity"], json!("High"));
    assert_eq!(entries[0]["source"], json!("github"));
    assert!(entries[0]["age_days"].is_u64());
}

#[tokio::test]
async fn api_actions_returns_guidance_text() {
    let mock = Arc::new(MockExtractor::new());
    mock.respond(
        "raw post",
        Insight {
            category: "auth".to_string(),
            summary: "Sessions drop hourly".to_string(),
            severity: Severity::Medium,
        },
    );
    let (app, _dir) = test_router(mock);

    let payload = json!([{
        "id": "so-1",
        "source": "stackoverflow",
        "url": "https://stackoverflow.com/q/1",
        "text": "raw post",
        "created_at": "2026-08-06T00:00:00Z"
    }]);
    let resp = app
        .clone()
        .oneshot(post_json("/ingest", &payload))
        .await
        .expect("oneshot /ingest");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(get("/actions"))
        .await
        .expect("oneshot /actions");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    let text = v["actions"].as_str().expect("actions is text");
    assert!(text.contains("Sessions drop hourly"), "got: {text}");
}

#[tokio::test]
async fn api_rejects_unparseable_timestamps() {
    let (app, _dir) = test_router(Arc::new(MockExtractor::new()));

    let payload = json!([{
        "id": "gh-1",
        "source": "github",
        "url": "https://example.test/1",
        "text": "text",
        "created_at": "yesterday-ish"
    }]);
    let resp = app
        .oneshot(post_json("/ingest", &payload))
        .await
        .expect("oneshot /ingest");
    assert!(
        resp.status().is_client_error(),
        "bad timestamp must be rejected at the boundary, got {}",
        resp.status()
    );
}

#[tokio::test]
async fn api_skips_invalid_items_without_failing_the_batch() {
    let (app, _dir) = test_router(Arc::new(MockExtractor::new()));

    let payload = json!([
        {
            "id": "gh-1",
            "source": "github",
            "url": "https://example.test/1",
            "text": "",
            "created_at": "2026-08-06T00:00:00Z"
        },
        {
            "id": "gh-2",
            "source": "github",
            "url": "https://example.test/2",
            "text": "real feedback",
            "created_at": "2026-08-06T00:00:00Z"
        }
    ]);
    let resp = app
        .clone()
        .oneshot(post_json("/ingest", &payload))
        .await
        .expect("oneshot /ingest");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["accepted"], json!(1));
}

#[tokio::test]
async fn api_debug_pipeline_exposes_counters() {
    let (app, _dir) = test_router(Arc::new(MockExtractor::new()));

    let resp = app
        .oneshot(get("/debug/pipeline"))
        .await
        .expect("oneshot /debug/pipeline");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["queue_depth"], json!(0));
    assert_eq!(v["store_size"], json!(0));
    assert_eq!(v["draining"], json!(false));
}
