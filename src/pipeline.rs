//! # Insight Pipeline
//! The ingestion-and-insight core: identity filtering, the ordered ingestion
//! queue, the single-flight drain worker, and the query entry points.
//!
//! Concurrency contract: at most one drain episode runs at any time. A caller
//! that needs a consistent read (queries) awaits the running episode's
//! completion handle instead of starting a second pass, so every queued item
//! is extracted exactly once and the store never sees two writers.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::extract::DynExtractor;
use crate::identity::{self, IdentityCache};
use crate::model::{ActionItem, ProcessedEntry, RawFeedbackItem};
use crate::rank;
use crate::store::InsightStore;

/// Returned by `query_actions` when there is nothing to synthesize from, or
/// when the collaborator is unavailable. Failures never cross the query
/// interface as errors.
pub const NO_ACTIONS_MESSAGE: &str =
    "No feedback available yet. Ingest community posts and try again.";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "insights_accepted_total",
            "Feedback items accepted into the queue."
        );
        describe_counter!(
            "insights_rejected_total",
            "Feedback items rejected at validation."
        );
        describe_counter!(
            "insights_duplicate_id_total",
            "Feedback items dropped by the identity filter."
        );
        describe_counter!("insights_stored_total", "Processed entries stored.");
        describe_counter!(
            "insights_deduped_total",
            "Processed entries discarded by summary dedup."
        );
        describe_counter!(
            "insights_extract_errors_total",
            "Per-item extraction failures (item skipped)."
        );
        describe_gauge!("insights_store_size", "Current number of stored insights.");
    });
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
}

/// Queue/store counters for the debug endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PipelineStats {
    pub queue_depth: usize,
    pub store_size: usize,
    pub seen_ids: usize,
    pub draining: bool,
}

/// Cheap-to-clone handle; all clones share the same queue, store, and
/// identity set. Constructed once at startup and passed to every operation.
#[derive(Clone)]
pub struct InsightPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    state: Mutex<PipelineState>,
    store: InsightStore,
    extractor: DynExtractor,
    identity: IdentityCache,
}

struct PipelineState {
    queue: VecDeque<RawFeedbackItem>,
    /// Cross-run id set, loaded from the identity cache and persisted back.
    seen: HashSet<String>,
    /// Process-local id set: guards against duplicate submissions within a
    /// single run even if the identity cache was lost.
    accepted: HashSet<String>,
    episode: Option<Episode>,
    next_episode: u64,
}

/// Handle to the drain episode currently in flight. Late callers clone the
/// receiver and await it instead of starting a second pass.
struct Episode {
    id: u64,
    done: watch::Receiver<bool>,
}

impl InsightPipeline {
    pub fn new(extractor: DynExtractor, identity: IdentityCache) -> Self {
        ensure_metrics_described();
        let seen = identity.load();
        if !seen.is_empty() {
            info!(ids = seen.len(), "identity cache loaded");
        }
        Self {
            inner: Arc::new(PipelineInner {
                state: Mutex::new(PipelineState {
                    queue: VecDeque::new(),
                    seen,
                    accepted: HashSet::new(),
                    episode: None,
                    next_episode: 0,
                }),
                store: InsightStore::new(),
                extractor,
                identity,
            }),
        }
    }

    /// Submit a batch of raw feedback items. Malformed items are rejected,
    /// already-seen ids are filtered, survivors are enqueued in order and a
    /// drain episode is triggered fire-and-forget: the caller does not wait
    /// for extraction.
    pub fn ingest(&self, items: Vec<RawFeedbackItem>) -> IngestReport {
        let total = items.len();
        let mut valid = Vec::with_capacity(items.len());
        for item in items {
            match item.validate() {
                Ok(()) => valid.push(item),
                Err(e) => {
                    warn!(id = %item.id, error = %e, "rejecting malformed feedback item");
                    counter!("insights_rejected_total").increment(1);
                }
            }
        }

        let valid_count = valid.len();
        let (accepted, ids_to_persist) = {
            let mut st = self.inner.state.lock().expect("pipeline state poisoned");
            let fresh = identity::filter_new(valid, &st.seen);
            let mut n = 0usize;
            for item in fresh {
                st.seen.insert(item.id.clone());
                if st.accepted.insert(item.id.clone()) {
                    st.queue.push_back(item);
                    n += 1;
                }
            }
            let snapshot = (n > 0).then(|| st.seen.clone());
            (n, snapshot)
        };

        counter!("insights_accepted_total").increment(accepted as u64);
        counter!("insights_duplicate_id_total").increment((valid_count - accepted) as u64);

        if let Some(ids) = ids_to_persist {
            // Best-effort; a failed save is logged inside and never blocks
            // ingestion.
            self.inner.identity.save(&ids);
            self.trigger_drain();
        }

        debug!(submitted = total, accepted, "ingest batch handled");
        IngestReport { accepted }
    }

    /// Start a drain episode if none is running and work is queued. Does not
    /// wait for it.
    pub fn trigger_drain(&self) {
        let _ = self.start_or_join();
    }

    /// Resolve once the queue has been observed empty at-or-after this call:
    /// either join the episode currently in flight, or start one if items are
    /// queued. A no-op when idle with an empty queue.
    pub async fn ensure_drained(&self) {
        if let Some(mut done) = self.start_or_join() {
            // Channel closure counts as completion too; the episode guard
            // guarantees the handle is released either way.
            let _ = done.wait_for(|finished| *finished).await;
        }
    }

    /// Ranked view of the store. Awaits the drain first so the query observes
    /// every item acknowledged before it began; items enqueued concurrently
    /// with the query may or may not be included, which is acceptable.
    pub async fn query_insights(&self) -> Vec<ProcessedEntry> {
        self.ensure_drained().await;
        rank::rank_entries(self.inner.store.snapshot())
    }

    /// Free-form action guidance synthesized from the ranked view. Read-only;
    /// collaborator failures degrade to a fixed message.
    pub async fn query_actions(&self) -> String {
        self.ensure_drained().await;
        let ranked = rank::rank_entries(self.inner.store.snapshot());
        if ranked.is_empty() {
            return NO_ACTIONS_MESSAGE.to_string();
        }
        let items: Vec<ActionItem> = ranked.iter().map(ActionItem::from).collect();
        match self.inner.extractor.synthesize_actions(&items).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "action synthesis failed");
                NO_ACTIONS_MESSAGE.to_string()
            }
        }
    }

    pub fn stats(&self) -> PipelineStats {
        let st = self.inner.state.lock().expect("pipeline state poisoned");
        PipelineStats {
            queue_depth: st.queue.len(),
            store_size: self.inner.store.len(),
            seen_ids: st.seen.len(),
            draining: st.episode.is_some(),
        }
    }

    /// Single-flight gate. Returns the completion handle of the episode the
    /// caller should await, or `None` when idle with an empty queue. The
    /// handle held in state always belongs to the episode that is still
    /// running, so callers can never latch onto one that finished earlier.
    fn start_or_join(&self) -> Option<watch::Receiver<bool>> {
        let mut st = self.inner.state.lock().expect("pipeline state poisoned");
        if let Some(ep) = &st.episode {
            return Some(ep.done.clone());
        }
        if st.queue.is_empty() {
            return None;
        }
        let (tx, rx) = watch::channel(false);
        st.next_episode += 1;
        let id = st.next_episode;
        st.episode = Some(Episode {
            id,
            done: rx.clone(),
        });
        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.run_episode(id, tx).await;
        });
        Some(rx)
    }

    /// One PROCESSING episode: pop-and-extract until the queue is observed
    /// empty. The empty-check and the handle release happen under the same
    /// lock, so a concurrent enqueue either lands in this episode or finds
    /// the pipeline idle and starts the next one, so no item can be stranded.
    async fn run_episode(&self, id: u64, tx: watch::Sender<bool>) {
        let guard = EpisodeGuard {
            inner: &self.inner,
            id,
            tx: &tx,
        };
        loop {
            let item = {
                let mut st = self.inner.state.lock().expect("pipeline state poisoned");
                match st.queue.pop_front() {
                    Some(item) => item,
                    None => {
                        if st.episode.as_ref().is_some_and(|ep| ep.id == id) {
                            st.episode = None;
                        }
                        break;
                    }
                }
            };
            self.process_item(item).await;
        }
        drop(guard);
    }

    /// Per-item step: extract, derive age, insert-if-absent. An extraction
    /// failure skips this item only; the drain continues.
    async fn process_item(&self, item: RawFeedbackItem) {
        let id = item.id.clone();
        match self.inner.extractor.extract(&item.text).await {
            Ok(insight) => {
                let entry = ProcessedEntry::from_parts(item, insight, Utc::now());
                let key = entry.dedup_key();
                if self.inner.store.insert_if_absent(key, entry) {
                    counter!("insights_stored_total").increment(1);
                    gauge!("insights_store_size").set(self.inner.store.len() as f64);
                } else {
                    debug!(id = %id, "duplicate summary; entry discarded");
                    counter!("insights_deduped_total").increment(1);
                }
            }
            Err(e) => {
                warn!(id = %id, error = %e, "insight extraction failed; skipping item");
                counter!("insights_extract_errors_total").increment(1);
            }
        }
    }
}

/// Releases the episode on every exit path: clears the in-flight handle (if
/// this episode still owns it) and wakes all waiters, even if the drain task
/// aborted abnormally.
struct EpisodeGuard<'a> {
    inner: &'a PipelineInner,
    id: u64,
    tx: &'a watch::Sender<bool>,
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut st) = self.inner.state.lock() {
            if st.episode.as_ref().is_some_and(|ep| ep.id == self.id) {
                st.episode = None;
            }
        }
        let _ = self.tx.send(true);
    }
}
