//! # Async Option Provider
//!
//! Remote-search dropdown support: debounce keystroke bursts, cancel
//! superseded lookups, and keep a bounded option list current. An empty
//! query means "fetch the default, unfiltered page", not "fetch nothing".
//! Network failures and non-success responses degrade to an empty list
//! rather than raising.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

use crate::error::ApiResult;

/// One selectable `{value, label}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Backend lookup for one dropdown's options.
#[async_trait]
pub trait OptionFetcher: Send + Sync {
    /// `search` is already trimmed; empty means the default page.
    async fn fetch_options(&self, search: &str) -> ApiResult<Vec<SelectOption>>;
}

/// Visible state for one dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionsSnapshot {
    pub options: Vec<SelectOption>,
    pub loading: bool,
}

struct ProviderShared {
    latest: AtomicU64,
    tx: watch::Sender<OptionsSnapshot>,
}

impl ProviderShared {
    fn apply(&self, generation: u64, options: Vec<SelectOption>) {
        if self.latest.load(Ordering::Acquire) != generation {
            trace!(generation, "Discarding stale option lookup");
            return;
        }
        self.tx.send_modify(|s| {
            s.options = options;
            s.loading = false;
        });
    }
}

/// Debounce-and-cancel loop for one remote-search dropdown.
pub struct OptionProvider {
    tx: mpsc::UnboundedSender<String>,
    snapshots: watch::Receiver<OptionsSnapshot>,
    task: JoinHandle<()>,
}

impl OptionProvider {
    /// Spawn the provider and immediately load the default option page.
    pub fn spawn(fetcher: Arc<dyn OptionFetcher>, quiet_period: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let (snapshot_tx, snapshots) = watch::channel(OptionsSnapshot::default());
        let shared = Arc::new(ProviderShared {
            latest: AtomicU64::new(0),
            tx: snapshot_tx,
        });

        let task = tokio::spawn(async move {
            let mut pending: Option<String> = None;
            let mut deadline: Option<Instant> = None;
            let mut in_flight: Option<JoinHandle<()>> = None;

            // Initial default page, issued without waiting for input.
            launch(&fetcher, &shared, &mut in_flight, String::new());

            loop {
                tokio::select! {
                    text = rx.recv() => match text {
                        None => break,
                        Some(text) => {
                            pending = Some(text.trim().to_string());
                            deadline = Some(Instant::now() + quiet_period);
                        }
                    },
                    () = async { sleep_until(deadline.unwrap()).await }, if deadline.is_some() => {
                        deadline = None;
                        if let Some(search) = pending.take() {
                            launch(&fetcher, &shared, &mut in_flight, search);
                        }
                    }
                }
            }

            if let Some(previous) = in_flight.take() {
                previous.abort();
            }
        });

        Self {
            tx,
            snapshots,
            task,
        }
    }

    /// Feed one keystroke's worth of search text.
    pub fn search(&self, text: impl Into<String>) {
        let _ = self.tx.send(text.into());
    }

    /// Subscribe to the option list and loading flag.
    pub fn snapshots(&self) -> watch::Receiver<OptionsSnapshot> {
        self.snapshots.clone()
    }
}

impl Drop for OptionProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn launch(
    fetcher: &Arc<dyn OptionFetcher>,
    shared: &Arc<ProviderShared>,
    in_flight: &mut Option<JoinHandle<()>>,
    search: String,
) {
    let generation = shared.latest.fetch_add(1, Ordering::AcqRel) + 1;
    if let Some(previous) = in_flight.take() {
        previous.abort();
    }

    debug!(generation, search = %search, "Issuing option lookup");
    shared.tx.send_modify(|s| s.loading = true);

    let fetcher = Arc::clone(fetcher);
    let shared = Arc::clone(shared);
    *in_flight = Some(tokio::spawn(async move {
        let options = match fetcher.fetch_options(&search).await {
            Ok(options) => options,
            Err(e) => {
                // Dropdowns degrade quietly; the worst case is an empty list.
                debug!(error = %e, "Option lookup failed, degrading to empty");
                Vec::new()
            }
        };
        shared.apply(generation, options);
    }));
}
