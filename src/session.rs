//! # Session State
//!
//! Process-wide authenticated session: the current principal, the access
//! credential, and the one-shot bootstrap latch that gates route access.
//!
//! The session is the only mutable resource shared across components. It is
//! mutated exclusively by the transport layer (on refresh) and by the
//! explicit login/logout/bootstrap flows; list and option components only
//! read it. All access is synchronous and the lock is never held across an
//! await point.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The authenticated user identity associated with a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Immutable snapshot of the session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<Principal>,
    pub access_token: Option<String>,
    /// Latches true exactly once, after the first identity check resolves
    pub is_bootstrapped: bool,
}

/// Owner of the session singleton.
///
/// Created empty at startup, populated on successful login or identity
/// bootstrap, cleared on logout or unrecoverable refresh failure.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Session {
        self.inner.read().clone()
    }

    /// Current access credential, if any.
    pub fn access_token(&self) -> Option<String> {
        self.inner.read().access_token.clone()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.inner.read().is_bootstrapped
    }

    /// Store a principal and credential after a successful login or bootstrap.
    pub fn set_session(&self, user: Option<Principal>, access_token: Option<String>) {
        let mut guard = self.inner.write();
        guard.user = user;
        guard.access_token = access_token;
        debug!(
            has_user = guard.user.is_some(),
            has_token = guard.access_token.is_some(),
            "Session updated"
        );
    }

    /// Replace only the access credential, keeping the principal.
    ///
    /// Used by the transport after a successful refresh.
    pub fn set_access_token(&self, token: String) {
        self.inner.write().access_token = Some(token);
        debug!("Access credential rotated");
    }

    /// Wipe credential and principal.
    ///
    /// The bootstrap latch survives: it must never reset while the
    /// application is running.
    pub fn clear(&self) {
        let mut guard = self.inner.write();
        guard.user = None;
        guard.access_token = None;
        info!("Session cleared");
    }

    /// Latch the bootstrap flag. Idempotent; never un-latches.
    pub fn mark_bootstrapped(&self) {
        let mut guard = self.inner.write();
        if !guard.is_bootstrapped {
            guard.is_bootstrapped = true;
            info!("Session bootstrap resolved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: 7,
            username: "jkowalski".to_string(),
            firstname: "Jan".to_string(),
            lastname: "Kowalski".to_string(),
            role: Some("admin".to_string()),
        }
    }

    #[test]
    fn starts_empty_and_unbootstrapped() {
        let store = SessionStore::new();
        let s = store.snapshot();
        assert_eq!(s.user, None);
        assert_eq!(s.access_token, None);
        assert!(!s.is_bootstrapped);
    }

    #[test]
    fn clear_wipes_credential_and_principal() {
        let store = SessionStore::new();
        store.set_session(Some(principal()), Some("tok-1".to_string()));
        store.clear();
        let s = store.snapshot();
        assert_eq!(s.user, None);
        assert_eq!(s.access_token, None);
    }

    #[test]
    fn bootstrap_latch_survives_clear() {
        let store = SessionStore::new();
        store.mark_bootstrapped();
        store.clear();
        assert!(store.is_bootstrapped());
        // latching again is a no-op
        store.mark_bootstrapped();
        assert!(store.is_bootstrapped());
    }

    #[test]
    fn token_rotation_keeps_principal() {
        let store = SessionStore::new();
        store.set_session(Some(principal()), Some("tok-1".to_string()));
        store.set_access_token("tok-2".to_string());
        let s = store.snapshot();
        assert_eq!(s.access_token.as_deref(), Some("tok-2"));
        assert_eq!(s.user, Some(principal()));
    }
}
