//! # Debounced Filter Synchronizer
//!
//! Buffers raw filter edits (one per keystroke or selection change) and
//! commits a validated filter object to the store only after a quiet
//! period. Canonical changes that did not originate here (an external
//! reset, another writer) are adopted into the local buffer without
//! re-triggering a debounce cycle; without that suppression, external
//! resets and local edits chase each other forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

use crate::query::state::{FilterSchema, QueryStateStore};

enum EditorCmd<F> {
    Edit(F),
    Reset,
}

/// Handle for feeding raw edits into the synchronizer.
#[derive(Debug)]
pub struct FilterEditor<F> {
    tx: mpsc::UnboundedSender<EditorCmd<F>>,
}

impl<F> FilterEditor<F> {
    /// Replace the working filter candidate; restarts the quiet period.
    pub fn edit(&self, candidate: F) {
        let _ = self.tx.send(EditorCmd::Edit(candidate));
    }

    /// Bypass debouncing and commit default filters immediately.
    pub fn reset(&self) {
        let _ = self.tx.send(EditorCmd::Reset);
    }
}

impl<F> Clone for FilterEditor<F> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Spawn the synchronizer task for one list view.
///
/// The task ends when every [`FilterEditor`] clone is dropped or the store's
/// subscribers are gone.
pub fn spawn_synchronizer<F: FilterSchema>(
    store: Arc<QueryStateStore<F>>,
    quiet_period: Duration,
) -> (FilterEditor<F>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        let mut canonical_rx = store.subscribe();
        let mut buffer = canonical_rx.borrow_and_update().filters.clone();
        // The last value this component itself produced; incoming canonical
        // state equal to it is our own echo.
        let mut last_committed = buffer.clone();
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    None => break,
                    Some(EditorCmd::Edit(candidate)) => {
                        buffer = candidate;
                        deadline = Some(Instant::now() + quiet_period);
                    }
                    Some(EditorCmd::Reset) => {
                        let defaults = F::defaults();
                        buffer = defaults.clone();
                        last_committed = defaults;
                        deadline = None;
                        debug!("Filter reset, committing defaults immediately");
                        store.reset();
                    }
                },
                changed = canonical_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let canonical = canonical_rx.borrow_and_update().filters.clone();
                    if canonical != last_committed {
                        trace!("Adopting externally changed canonical filters");
                        buffer = canonical.clone();
                        last_committed = canonical;
                        deadline = None;
                    }
                },
                () = async { sleep_until(deadline.unwrap()).await }, if deadline.is_some() => {
                    deadline = None;
                    match F::normalize(buffer.clone()) {
                        Ok(filters) => {
                            if filters != last_committed {
                                last_committed = filters.clone();
                                store.commit_filters(filters);
                            }
                        }
                        Err(reason) => {
                            // Held, not applied; no error surfaced here.
                            debug!(%reason, "Holding invalid filter edit");
                        }
                    }
                }
            }
        }
    });

    (FilterEditor { tx }, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::state::FilterRejected;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct SearchFilters {
        q: String,
    }

    impl FilterSchema for SearchFilters {
        fn defaults() -> Self {
            Self { q: String::new() }
        }

        fn normalize(candidate: Self) -> Result<Self, FilterRejected> {
            if candidate.q.contains('\u{0}') {
                return Err(FilterRejected("control character".into()));
            }
            Ok(Self {
                q: candidate.q.trim().to_string(),
            })
        }

        fn query_pairs(&self) -> Vec<(String, String)> {
            Vec::new()
        }
    }

    fn edits(q: &str) -> SearchFilters {
        SearchFilters { q: q.to_string() }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_commits_once_with_final_value() {
        let store = Arc::new(QueryStateStore::<SearchFilters>::new(10));
        let mut canonical = store.subscribe();
        let (editor, _task) = spawn_synchronizer(Arc::clone(&store), Duration::from_millis(300));

        editor.edit(edits("a"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        editor.edit(edits("ab"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        editor.edit(edits("abc"));

        // Quiet period has not elapsed since the last edit yet.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!canonical.has_changed().unwrap());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(canonical.has_changed().unwrap());
        assert_eq!(canonical.borrow_and_update().filters.q, "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn own_commit_does_not_echo_a_second_commit() {
        let store = Arc::new(QueryStateStore::<SearchFilters>::new(10));
        let (editor, _task) = spawn_synchronizer(Arc::clone(&store), Duration::from_millis(300));

        editor.edit(edits("acme"));
        tokio::time::sleep(Duration::from_millis(400)).await;

        let mut canonical = store.subscribe();
        assert_eq!(canonical.borrow_and_update().filters.q, "acme");

        // Let the synchronizer observe its own commit coming back down:
        // nothing further may be emitted.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!canonical.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn external_change_is_adopted_without_emitting() {
        let store = Arc::new(QueryStateStore::<SearchFilters>::new(10));
        let (editor, _task) = spawn_synchronizer(Arc::clone(&store), Duration::from_millis(300));

        // External writer commits directly to the store.
        store.commit_filters(edits("external"));
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let mut canonical = store.subscribe();
        assert_eq!(canonical.borrow_and_update().filters.q, "external");

        // A later local edit debounces from the adopted buffer.
        editor.edit(edits("external plus"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.snapshot().filters.q, "external plus");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_edit_is_held_silently() {
        let store = Arc::new(QueryStateStore::<SearchFilters>::new(10));
        let (editor, _task) = spawn_synchronizer(Arc::clone(&store), Duration::from_millis(300));

        editor.edit(edits("bad\u{0}value"));
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(store.snapshot().filters.q, "");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_bypasses_debounce() {
        let store = Arc::new(QueryStateStore::<SearchFilters>::new(10));
        let (editor, _task) = spawn_synchronizer(Arc::clone(&store), Duration::from_millis(300));

        editor.edit(edits("typing"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.snapshot().filters.q, "typing");

        editor.reset();
        // No quiet period: the reset lands as soon as the task runs.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(store.snapshot().filters.q, "");
        assert_eq!(store.snapshot().page, 0);
    }
}
