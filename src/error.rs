// src/error.rs
// Pipeline error taxonomy. None of these are fatal to the process: each is
// caught at the boundary of the operation that can fail, logged, and the
// pipeline degrades (skipped source, skipped item, in-memory-only identity).

use thiserror::Error;

/// Malformed input at the ingestion boundary. The item is rejected, never
/// half-accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("feedback item id is empty")]
    EmptyId,
    #[error("feedback item text is empty")]
    EmptyText,
}

/// A source fetch failed; that source is skipped for the current cycle.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("collector http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("collector returned an unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The extraction collaborator failed for one item; the item is skipped and
/// the drain continues.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extractor http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("extractor returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("extractor response is not a valid insight: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("extractor api key is missing")]
    MissingApiKey,
    #[error("extractor returned an empty response")]
    EmptyResponse,
    #[error("extraction is disabled by configuration")]
    Disabled,
}

/// Identity cache read/write failed; ingestion continues with in-memory state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("identity cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity cache is corrupt: {0}")]
    Parse(#[from] serde_json::Error),
}
