// src/store.rs
// In-memory, deduplicated collection of processed insights. Entries are
// append-only: insert-if-absent, never merged or overwritten. Rebuilt from
// scratch on process restart.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::model::ProcessedEntry;

#[derive(Debug, Default)]
pub struct InsightStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    keys: HashSet<String>,
    /// Insertion order; the ranked view uses it as the final tie-break.
    entries: Vec<ProcessedEntry>,
}

impl InsightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the dedup key is already present. First-seen wins; a
    /// duplicate is discarded and `false` returned.
    pub fn insert_if_absent(&self, key: String, entry: ProcessedEntry) -> bool {
        let mut inner = self.inner.lock().expect("insight store mutex poisoned");
        if !inner.keys.insert(key) {
            return false;
        }
        inner.entries.push(entry);
        true
    }

    /// Copy of the entries in insertion order; callers may sort or mutate it
    /// without affecting the store.
    pub fn snapshot(&self) -> Vec<ProcessedEntry> {
        let inner = self.inner.lock().expect("insight store mutex poisoned");
        inner.entries.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("insight store mutex poisoned");
        inner.entries.len()
    }
}
