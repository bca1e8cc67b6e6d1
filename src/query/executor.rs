//! # Query Executor
//!
//! Maintains exactly one logical "current" fetch per query-state change.
//! Superseded requests are aborted proactively, and a monotonically
//! increasing generation counter decides whether a resolving fetch may
//! touch visible state. A late-resolving older request can never overwrite
//! a newer one, no matter the resolve order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{ApiResult, Problem};
use crate::query::state::{FilterSchema, QueryState};
use crate::transport::paging::PagedResult;

/// One list view's backend reader.
#[async_trait]
pub trait ListFetcher<F, R>: Send + Sync {
    async fn fetch_page(&self, query: &QueryState<F>) -> ApiResult<PagedResult<R>>;
}

/// Visible result state for one list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<R> {
    pub rows: Vec<R>,
    pub total_elements: u64,
    pub total_pages: u64,
    /// Covers the current generation only: true from issue to resolution
    pub loading: bool,
    /// Non-cancellation failure of the current generation, with retry left
    /// to the caller
    pub error: Option<Problem>,
}

impl<R> Default for ListSnapshot<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            loading: false,
            error: None,
        }
    }
}

struct ExecutorShared<R> {
    /// Generation of the most recently issued fetch
    latest: AtomicU64,
    tx: watch::Sender<ListSnapshot<R>>,
}

impl<R: Clone> ExecutorShared<R> {
    fn apply(&self, generation: u64, result: ApiResult<PagedResult<R>>) {
        if self.latest.load(Ordering::Acquire) != generation {
            trace!(generation, "Discarding stale fetch result");
            return;
        }
        match result {
            Ok(page) => {
                self.tx.send_modify(|s| {
                    s.rows = page.content;
                    s.total_elements = page.total_elements;
                    s.total_pages = page.total_pages;
                    s.loading = false;
                    s.error = None;
                });
            }
            Err(e) if e.is_cancelled() => {
                trace!(generation, "Fetch cancelled, ignoring");
            }
            Err(e) => {
                let problem = e
                    .problem()
                    .cloned()
                    .unwrap_or_else(|| Problem::network(e.to_string()));
                debug!(generation, error = %problem, "Fetch failed");
                self.tx.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(problem);
                });
            }
        }
    }
}

/// Issues and races fetches for one list view.
pub struct QueryExecutor<F: FilterSchema, R: Clone + Send + Sync + 'static> {
    fetcher: Arc<dyn ListFetcher<F, R>>,
    shared: Arc<ExecutorShared<R>>,
    last_query: Option<QueryState<F>>,
    in_flight: Option<JoinHandle<()>>,
}

impl<F: FilterSchema, R: Clone + Send + Sync + 'static> QueryExecutor<F, R> {
    pub fn new(fetcher: Arc<dyn ListFetcher<F, R>>) -> Self {
        let (tx, _) = watch::channel(ListSnapshot::default());
        Self {
            fetcher,
            shared: Arc::new(ExecutorShared {
                latest: AtomicU64::new(0),
                tx,
            }),
            last_query: None,
            in_flight: None,
        }
    }

    /// Subscribe to visible result state.
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<R>> {
        self.shared.tx.subscribe()
    }

    /// React to a query-state change. Structural equality with the last
    /// issued query suppresses redundant fetches.
    pub fn submit(&mut self, query: &QueryState<F>) {
        if self.last_query.as_ref() == Some(query) {
            trace!("Query unchanged, skipping fetch");
            return;
        }
        self.launch(query.clone());
    }

    /// Re-issue the last query unconditionally (retry affordance).
    pub fn retry(&mut self) {
        if let Some(query) = self.last_query.clone() {
            self.launch(query);
        }
    }

    fn launch(&mut self, query: QueryState<F>) {
        // Bump the generation before aborting the predecessor: once the
        // counter has moved, any result still in flight is stale by
        // definition and will be discarded on arrival.
        let generation = self.shared.latest.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }

        debug!(generation, page = query.page, size = query.size, "Issuing list fetch");
        self.shared.tx.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        self.last_query = Some(query.clone());
        let fetcher = Arc::clone(&self.fetcher);
        let shared = Arc::clone(&self.shared);
        self.in_flight = Some(tokio::spawn(async move {
            let result = fetcher.fetch_page(&query).await;
            shared.apply(generation, result);
        }));
    }
}

impl<F: FilterSchema, R: Clone + Send + Sync + 'static> Drop for QueryExecutor<F, R> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort();
        }
    }
}
