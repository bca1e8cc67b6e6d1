//! # List Engine
//!
//! One engine per list view: owns the query state store, feeds the
//! debounced filter synchronizer, and drives the query executor on every
//! canonical state change. Views dispatch intents through the engine and
//! render from its snapshot channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::query::debounce::{spawn_synchronizer, FilterEditor};
use crate::query::executor::{ListFetcher, ListSnapshot, QueryExecutor};
use crate::query::state::{FilterSchema, QueryState, QueryStateStore};

enum EngineCmd {
    Retry,
}

/// Per-view binding of store, synchronizer, and executor.
pub struct ListEngine<F: FilterSchema, R: Clone + Send + Sync + 'static> {
    store: Arc<QueryStateStore<F>>,
    editor: FilterEditor<F>,
    snapshots: watch::Receiver<ListSnapshot<R>>,
    commands: mpsc::UnboundedSender<EngineCmd>,
    driver: JoinHandle<()>,
    synchronizer: JoinHandle<()>,
}

impl<F: FilterSchema, R: Clone + Send + Sync + 'static> ListEngine<F, R> {
    /// Build the engine and issue the initial fetch for the default query.
    pub fn new(
        fetcher: Arc<dyn ListFetcher<F, R>>,
        page_size: u32,
        quiet_period: Duration,
    ) -> Self {
        let store = Arc::new(QueryStateStore::new(page_size));
        let (editor, synchronizer) = spawn_synchronizer(Arc::clone(&store), quiet_period);

        let mut executor = QueryExecutor::new(fetcher);
        let snapshots = executor.subscribe();
        let mut canonical = store.subscribe();
        let (commands, mut command_rx) = mpsc::unbounded_channel();

        let driver = tokio::spawn(async move {
            let initial = canonical.borrow_and_update().clone();
            executor.submit(&initial);
            loop {
                tokio::select! {
                    changed = canonical.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let query = canonical.borrow_and_update().clone();
                        executor.submit(&query);
                    }
                    cmd = command_rx.recv() => match cmd {
                        Some(EngineCmd::Retry) => executor.retry(),
                        None => break,
                    }
                }
            }
        });

        Self {
            store,
            editor,
            snapshots,
            commands,
            driver,
            synchronizer,
        }
    }

    /// Intent: pure page navigation.
    pub fn set_page(&self, page: u32) {
        self.store.set_page(page);
    }

    /// Intent: change page size (resets to first page).
    pub fn set_page_size(&self, size: u32) {
        self.store.set_page_size(size);
    }

    /// Intent: toggle or switch the sort field (resets to first page).
    pub fn set_sort(&self, field: &str) {
        self.store.set_sort(field);
    }

    /// The debounced entry point for raw filter edits.
    pub fn filters(&self) -> &FilterEditor<F> {
        &self.editor
    }

    /// Re-issue the current query after a surfaced error.
    pub fn retry(&self) {
        let _ = self.commands.send(EngineCmd::Retry);
    }

    /// Current committed query state.
    pub fn query(&self) -> QueryState<F> {
        self.store.snapshot()
    }

    /// Subscribe to rows/totals/loading/error for rendering.
    pub fn snapshots(&self) -> watch::Receiver<ListSnapshot<R>> {
        self.snapshots.clone()
    }
}

impl<F: FilterSchema, R: Clone + Send + Sync + 'static> Drop for ListEngine<F, R> {
    fn drop(&mut self) {
        self.driver.abort();
        self.synchronizer.abort();
    }
}
