// src/collect/mod.rs
pub mod github;
pub mod scheduler;
pub mod stackoverflow;

use async_trait::async_trait;
use metrics::counter;

use crate::error::CollectorError;
use crate::model::RawFeedbackItem;
use crate::pipeline::{IngestReport, InsightPipeline};

/// One external data source of community posts. Implementations must return
/// globally unique, source-prefixed ids (`gh-…`, `so-…`) and a parseable
/// `created_at`.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<RawFeedbackItem>, CollectorError>;
    fn name(&self) -> &'static str;
}

/// Fetch from every collector once and hand the combined batch to the
/// pipeline. A failing source is logged and skipped for this cycle; it never
/// aborts the other sources or the process.
pub async fn poll_once(
    collectors: &[Box<dyn Collector>],
    pipeline: &InsightPipeline,
) -> IngestReport {
    let mut items = Vec::new();
    for c in collectors {
        match c.fetch_items().await {
            Ok(mut v) => {
                tracing::debug!(collector = c.name(), fetched = v.len(), "collector fetch");
                items.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(collector = c.name(), error = %e, "collector error; skipping source this cycle");
                counter!("collect_errors_total").increment(1);
            }
        }
    }
    pipeline.ingest(items)
}

/// Normalize collector text before it enters the queue: decode HTML entities,
/// strip tags, collapse whitespace, cap the length. StackOverflow bodies in
/// particular arrive as HTML.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // Length cap: keep extraction prompts bounded.
    if out.chars().count() > 4000 {
        out = out.chars().take(4000).collect();
    }

    out
}

/// Title plus optional body, normalized. Empty bodies fall back to the title
/// alone.
pub(crate) fn compose_text(title: &str, body: Option<&str>) -> String {
    let raw = match body {
        Some(b) if !b.trim().is_empty() => format!("{title}\n\n{b}"),
        _ => title.to_string(),
    };
    normalize_text(&raw)
}
