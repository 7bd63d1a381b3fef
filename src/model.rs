// src/model.rs
// Typed data model for the pipeline: raw feedback items as submitted by
// collectors, the insight structure returned by the extractor, and the
// processed entry owned by the store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const SECS_PER_DAY: i64 = 86_400;

/// Where a feedback item came from. Open set: unknown sources round-trip
/// through `Other` instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    GitHub,
    StackOverflow,
    Other(String),
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "github" => Source::GitHub,
            "stackoverflow" => Source::StackOverflow,
            _ => Source::Other(s),
        }
    }
}

impl From<Source> for String {
    fn from(s: Source) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::GitHub => f.write_str("github"),
            Source::StackOverflow => f.write_str("stackoverflow"),
            Source::Other(s) => f.write_str(s),
        }
    }
}

/// One externally sourced post (issue / question) awaiting insight extraction.
/// `id` is globally unique per source+item and stable across polls; collectors
/// prefix it per source (`gh-…`, `so-…`) so ids never collide across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeedbackItem {
    pub id: String,
    pub source: Source,
    pub url: String,
    pub text: String,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl RawFeedbackItem {
    /// Boundary check before an item may enter the queue. An unparseable
    /// timestamp never reaches this point; serde rejects it at the edge.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(())
    }
}

/// Severity as reported by the extraction collaborator. Anything it returns
/// outside the known three buckets lands in `Unknown`, which ranks below Low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            _ => Severity::Unknown,
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.to_string()
    }
}

impl Severity {
    /// Sort weight: High > Medium > Low > Unknown.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => f.write_str("Low"),
            Severity::Medium => f.write_str("Medium"),
            Severity::High => f.write_str("High"),
            Severity::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Structured insight extracted from one raw text block. Two different raw
/// items may yield an identical summary; the store collapses those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: String,
    pub summary: String,
    #[serde(default)]
    pub severity: Severity,
}

/// Union of the raw item and its insight, plus `age_days` computed once at
/// processing time. A snapshot: it is NOT re-derived at query time, so a
/// long-lived entry keeps the age it had when it was processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEntry {
    pub id: String,
    pub source: Source,
    pub url: String,
    pub text: String,
    pub category: String,
    pub summary: String,
    pub severity: Severity,
    pub age_days: u64,
    pub created_at: DateTime<Utc>,
}

impl ProcessedEntry {
    pub fn from_parts(item: RawFeedbackItem, insight: Insight, now: DateTime<Utc>) -> Self {
        let age_days = age_days(item.created_at, now);
        Self {
            id: item.id,
            source: item.source,
            url: item.url,
            text: item.text,
            category: insight.category,
            summary: insight.summary,
            severity: insight.severity,
            age_days,
            created_at: item.created_at,
        }
    }

    /// Key under which the store collapses duplicate insights.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.summary)
    }
}

/// Normalized dedup key: the summary lowercased.
pub fn dedup_key(summary: &str) -> String {
    summary.to_lowercase()
}

/// Whole days elapsed between `created_at` and `now`. Items dated in the
/// future clamp to 0.
pub fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let secs = (now - created_at).num_seconds().max(0);
    (secs / SECS_PER_DAY) as u64
}

/// Projection handed to action synthesis: summary, severity, and age only;
/// no raw text and no URLs leave the process on that path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItem {
    pub summary: String,
    pub severity: Severity,
    pub age_days: u64,
}

impl From<&ProcessedEntry> for ActionItem {
    fn from(e: &ProcessedEntry) -> Self {
        Self {
            summary: e.summary.clone(),
            severity: e.severity,
            age_days: e.age_days,
        }
    }
}
