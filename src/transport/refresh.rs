//! # Single-Flight Refresh Coordination
//!
//! Explicit two-state machine (Idle / Refreshing) for credential refresh.
//! The first caller that observes an authorization failure becomes the
//! leader and issues the one refresh call; every caller that arrives while
//! the cycle is in flight enqueues as a waiter and shares the leader's
//! outcome. Waiters are woken in FIFO enqueue order.
//!
//! The coordinator knows nothing about HTTP: the leader's refresh operation
//! is passed in as a future returning success/failure, which keeps the
//! single-flight and replay-exactly-once guarantees independently testable.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome of one refresh cycle, shared by leader and waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new credential was stored; blocked requests replay once.
    Refreshed,
    /// The refresh call failed or timed out; the session must be cleared
    /// and blocked requests reject as unauthorized.
    Failed,
}

/// State for the lifetime of a single refresh cycle.
///
/// Cleared synchronously the instant the cycle resolves, before any waiter
/// is woken.
#[derive(Debug, Default)]
struct RefreshState {
    in_progress: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Coordinates at most one outstanding refresh call.
#[derive(Debug)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    /// Bound on the refresh call; an unbounded hang here would deadlock
    /// every queued waiter.
    timeout: Duration,
}

impl RefreshCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Mutex::new(RefreshState::default()),
            timeout,
        }
    }

    /// Join the current refresh cycle, starting one if none is in flight.
    ///
    /// The leader runs `refresh` under the configured timeout; followers
    /// suspend until the leader resolves. Exactly one `refresh` future is
    /// ever outstanding at a time.
    pub async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        let follower_rx = {
            let mut state = self.state.lock();
            if state.in_progress {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            } else {
                state.in_progress = true;
                None
            }
        };

        if let Some(rx) = follower_rx {
            debug!("Refresh already in flight, waiting for its outcome");
            // A dropped sender means the leader panicked mid-cycle; treat
            // as a failed refresh rather than hanging.
            return rx.await.unwrap_or(RefreshOutcome::Failed);
        }

        debug!(timeout_ms = self.timeout.as_millis() as u64, "Starting credential refresh");
        let refreshed = match tokio::time::timeout(self.timeout, refresh()).await {
            Ok(ok) => ok,
            Err(_) => {
                warn!("Credential refresh timed out");
                false
            }
        };

        let outcome = if refreshed {
            RefreshOutcome::Refreshed
        } else {
            RefreshOutcome::Failed
        };

        let waiters = {
            let mut state = self.state.lock();
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(
            outcome = ?outcome,
            waiters = waiters.len(),
            "Refresh cycle resolved"
        );
        for waiter in waiters {
            let _ = waiter.send(outcome);
        }

        outcome
    }

    #[cfg(test)]
    fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }
}
