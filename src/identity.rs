// src/identity.rs
// File-backed set of already-accepted feedback ids, so a restart does not
// re-ingest posts the previous run already handled. Persistence is strictly
// best-effort: a missing or corrupt file loads as empty, and a failed save is
// logged and swallowed; ingestion must keep going either way.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::model::RawFeedbackItem;

pub struct IdentityCache {
    path: PathBuf,
}

impl IdentityCache {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted id set. Never fails the caller.
    pub fn load(&self) -> HashSet<String> {
        match self.try_load() {
            Ok(ids) => ids,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "identity cache unavailable; starting empty");
                HashSet::new()
            }
        }
    }

    /// Persist the full current set, overwriting prior contents. Failure is
    /// logged and swallowed.
    pub fn save(&self, ids: &HashSet<String>) {
        if let Err(e) = self.try_save(ids) {
            warn!(path = %self.path.display(), error = %e, "failed to persist identity cache");
        }
    }

    fn try_load(&self) -> Result<HashSet<String>, PersistenceError> {
        let data = fs::read_to_string(&self.path)?;
        let ids: Vec<String> = serde_json::from_str(&data)?;
        Ok(ids.into_iter().collect())
    }

    fn try_save(&self, ids: &HashSet<String>) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        // Sorted output keeps the file diffable between runs.
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        let json = serde_json::to_string_pretty(&sorted)?;
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }
}

/// Write via tmp file + rename so a crash mid-write never leaves a torn file.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(bytes)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Order-preserving subsequence of `items` whose id is not in `seen`.
pub fn filter_new(items: Vec<RawFeedbackItem>, seen: &HashSet<String>) -> Vec<RawFeedbackItem> {
    items
        .into_iter()
        .filter(|item| !seen.contains(&item.id))
        .collect()
}
