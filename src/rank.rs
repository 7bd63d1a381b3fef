//! # Ranking
//! Pure, testable logic that orders processed insights for presentation.
//! No I/O; the pipeline feeds it store snapshots.
//!
//! Policy: severity descending (High > Medium > Low > Unknown), then age
//! ascending so newer pain points surface first within a severity band. The
//! sort is stable, so equal-rank entries keep the snapshot's insertion order
//! as the deterministic tie-break.

use crate::model::ProcessedEntry;

pub fn rank_entries(mut entries: Vec<ProcessedEntry>) -> Vec<ProcessedEntry> {
    entries.sort_by(|a, b| {
        b.severity
            .rank()
            .cmp(&a.severity.rank())
            .then(a.age_days.cmp(&b.age_days))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, Source};
    use chrono::Utc;

    fn entry(id: &str, severity: Severity, age_days: u64) -> ProcessedEntry {
        ProcessedEntry {
            id: id.to_string(),
            source: Source::GitHub,
            url: String::new(),
            text: String::new(),
            category: "general".to_string(),
            summary: format!("summary {id}"),
            severity,
            age_days,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn severity_desc_then_age_asc() {
        let entries = vec![
            entry("a", Severity::Low, 1),
            entry("b", Severity::High, 5),
            entry("c", Severity::Medium, 2),
            entry("d", Severity::High, 1),
        ];
        let ranked = rank_entries(entries);
        let ids: Vec<&str> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn unknown_severity_sorts_last() {
        let entries = vec![
            entry("u", Severity::Unknown, 0),
            entry("l", Severity::Low, 9),
        ];
        let ranked = rank_entries(entries);
        assert_eq!(ranked[0].id, "l");
        assert_eq!(ranked[1].id, "u");
    }

    #[test]
    fn full_ties_keep_insertion_order() {
        let entries = vec![
            entry("first", Severity::Medium, 3),
            entry("second", Severity::Medium, 3),
        ];
        let ranked = rank_entries(entries);
        assert_eq!(ranked[0].id, "first");
        assert_eq!(ranked[1].id, "second");
    }
}
