// tests/single_flight.rs
//
// The single-flight guarantee: concurrent queries over a loaded queue share
// one drain episode, so every queued item is extracted exactly once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use community_insights::extract::{DynExtractor, MockExtractor};
use community_insights::identity::IdentityCache;
use community_insights::model::{RawFeedbackItem, Source};
use community_insights::pipeline::InsightPipeline;

fn item(id: &str, text: &str) -> RawFeedbackItem {
    RawFeedbackItem {
        id: id.to_string(),
        source: Source::StackOverflow,
        url: format!("https://example.test/{id}"),
        text: text.to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn concurrent_queries_share_one_drain_episode() {
    let dir = tempfile::tempdir().expect("tempdir");
    // The delay keeps the episode alive long enough for both queries to join it.
    let mock = Arc::new(MockExtractor::with_delay(Duration::from_millis(30)));
    let pipeline = InsightPipeline::new(
        mock.clone() as DynExtractor,
        IdentityCache::new(dir.path().join("ingested.json")),
    );

    pipeline.ingest(vec![
        item("so-1", "queue grows unbounded"),
        item("so-2", "login token expires"),
        item("so-3", "docs example is stale"),
    ]);

    let (a, b) = tokio::join!(pipeline.query_insights(), pipeline.query_insights());

    assert_eq!(a.len(), 3);
    assert_eq!(a, b, "both queries observe the same drained store");
    assert_eq!(
        mock.calls(),
        3,
        "each queued item is extracted exactly once, not once per caller"
    );
}

#[tokio::test]
async fn ensure_drained_is_a_noop_when_idle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mock = Arc::new(MockExtractor::new());
    let pipeline = InsightPipeline::new(
        mock.clone() as DynExtractor,
        IdentityCache::new(dir.path().join("ingested.json")),
    );

    pipeline.ensure_drained().await;
    pipeline.ensure_drained().await;
    assert_eq!(mock.calls(), 0);
    assert!(!pipeline.stats().draining);
}

#[tokio::test]
async fn a_query_after_a_finished_episode_starts_a_fresh_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mock = Arc::new(MockExtractor::new());
    let pipeline = InsightPipeline::new(
        mock.clone() as DynExtractor,
        IdentityCache::new(dir.path().join("ingested.json")),
    );

    pipeline.ingest(vec![item("so-1", "first batch")]);
    pipeline.ensure_drained().await;
    assert_eq!(mock.calls(), 1);

    // A second batch after the first episode completed must be drained by a
    // new episode, not resolved against the stale finished one.
    pipeline.ingest(vec![item("so-2", "second batch")]);
    let entries = pipeline.query_insights().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(mock.calls(), 2);
}
