//! # Query State Store
//!
//! Single source of truth for one list view's server-bound query: page,
//! page size, sort, and validated filters. Views dispatch intents and read
//! snapshots; every mutation funnels through the store and resets
//! pagination where required. Page numbering is zero-based throughout;
//! one-based display is a UI-boundary conversion this crate never performs.

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tracing::trace;

/// Sort direction, serialized on the wire as `asc`/`desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// A filter candidate failed validation and was held back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("filter candidate rejected: {0}")]
pub struct FilterRejected(pub String);

/// Schema boundary for one list view's filter object.
///
/// `normalize` is the pure validator: candidate in, normalized/defaulted
/// object out, or rejection. The store and synchronizer only ever hold
/// values that came out of `normalize` (or `defaults`).
pub trait FilterSchema: Clone + PartialEq + Send + Sync + 'static {
    /// The defaults, re-applied on reset.
    fn defaults() -> Self;

    /// Validate and canonicalize a candidate.
    fn normalize(candidate: Self) -> Result<Self, FilterRejected>;

    /// Wire query parameters; array-valued filters repeat the key.
    fn query_pairs(&self) -> Vec<(String, String)>;
}

/// The committed, server-bound combination of page, size, sort, and filters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<F> {
    /// Zero-based page index
    pub page: u32,
    pub size: u32,
    pub sort_by: Option<String>,
    pub sort_dir: SortDir,
    pub filters: F,
}

impl<F: FilterSchema> QueryState<F> {
    pub fn initial(size: u32) -> Self {
        Self {
            page: 0,
            size,
            sort_by: None,
            sort_dir: SortDir::Asc,
            filters: F::defaults(),
        }
    }

    /// Map this state to wire parameters: `page`, `size`,
    /// `sort=<field>,<asc|desc>`, then the filter-specific pairs.
    pub fn wire_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        if let Some(field) = &self.sort_by {
            params.push((
                "sort".to_string(),
                format!("{field},{}", self.sort_dir.as_str()),
            ));
        }
        params.extend(self.filters.query_pairs());
        params
    }
}

/// Exclusive owner of one list view's [`QueryState`].
///
/// All operations are synchronous and total; each produces a new immutable
/// snapshot published to subscribers. Back-to-back operations compose as
/// sequential application.
pub struct QueryStateStore<F: FilterSchema> {
    // Serializes intent application; the watch channel publishes snapshots.
    mutation_lock: Mutex<()>,
    tx: watch::Sender<QueryState<F>>,
}

impl<F: FilterSchema> QueryStateStore<F> {
    pub fn new(page_size: u32) -> Self {
        let (tx, _) = watch::channel(QueryState::initial(page_size));
        Self {
            mutation_lock: Mutex::new(()),
            tx,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> QueryState<F> {
        self.tx.borrow().clone()
    }

    /// Subscribe to canonical state changes.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<F>> {
        self.tx.subscribe()
    }

    /// Pure page navigation; the only mutation that keeps `page`.
    pub fn set_page(&self, page: u32) {
        self.apply(|s| s.page = page);
    }

    pub fn set_page_size(&self, size: u32) {
        self.apply(|s| {
            s.size = size;
            s.page = 0;
        });
    }

    /// Toggle direction on the active sort field, or switch to a new field
    /// ascending. Resets pagination either way.
    pub fn set_sort(&self, field: &str) {
        self.apply(|s| {
            if s.sort_by.as_deref() == Some(field) {
                s.sort_dir = s.sort_dir.toggled();
            } else {
                s.sort_by = Some(field.to_string());
                s.sort_dir = SortDir::Asc;
            }
            s.page = 0;
        });
    }

    /// Merge a patch into the current filters and re-validate. A rejected
    /// candidate leaves the state untouched; the operation itself never
    /// fails.
    pub fn set_filters(&self, patch: impl FnOnce(&mut F)) {
        let _guard = self.mutation_lock.lock();
        let mut candidate = self.tx.borrow().filters.clone();
        patch(&mut candidate);
        match F::normalize(candidate) {
            Ok(filters) => {
                self.tx.send_if_modified(|s| {
                    if s.filters == filters {
                        return false;
                    }
                    s.filters = filters;
                    s.page = 0;
                    true
                });
            }
            Err(reason) => trace!(%reason, "Filter patch rejected, state unchanged"),
        }
    }

    /// Commit an already-validated filter object (the synchronizer's path).
    pub fn commit_filters(&self, filters: F) {
        self.apply_if(|s| {
            if s.filters == filters {
                return false;
            }
            s.filters = filters;
            s.page = 0;
            true
        });
    }

    /// Restore default filters and first page.
    pub fn reset(&self) {
        self.apply(|s| {
            s.filters = F::defaults();
            s.page = 0;
        });
    }

    fn apply(&self, mutate: impl FnOnce(&mut QueryState<F>)) {
        let _guard = self.mutation_lock.lock();
        self.tx.send_if_modified(|s| {
            let before = s.clone();
            mutate(s);
            *s != before
        });
    }

    fn apply_if(&self, mutate: impl FnOnce(&mut QueryState<F>) -> bool) {
        let _guard = self.mutation_lock.lock();
        self.tx.send_if_modified(mutate);
    }
}
