//! Token store: the single source of truth for the current credential.
//!
//! DESIGN
//! ======
//! The credential lives in a `tokio::sync::watch` channel. Readers call
//! `get`/`is_authenticated` for a synchronous snapshot, and observers hold a
//! `SessionWatch` that wakes on every `set`/`clear`. Writes replace the value
//! in one step, so no reader ever sees a half-applied update.
//!
//! ERROR HANDLING
//! ==============
//! Durable storage failures are logged and swallowed. The in-memory value is
//! always updated first, so a full disk never leaves the session stuck in a
//! state the caller did not ask for.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;

use super::storage::{CookieMirror, MemoryStorage, Storage};

/// Storage key (and cookie name) the credential is kept under.
pub const TOKEN_KEY: &str = "access_token";

/// Cloneable handle to the process-wide session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: watch::Sender<String>,
    storage: Arc<dyn Storage>,
    cookies: Mutex<Vec<Weak<dyn CookieMirror>>>,
}

impl SessionStore {
    /// Restore the session from `storage`. A missing or unreadable key
    /// starts the session unauthenticated.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let token = match storage.get_item(TOKEN_KEY) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored credential");
                String::new()
            }
        };
        tracing::debug!(authenticated = !token.is_empty(), "session loaded");
        Self {
            inner: Arc::new(SessionInner {
                token: watch::Sender::new(token),
                storage,
                cookies: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fresh unauthenticated session with nothing persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStorage::new()))
    }

    /// Register a cookie location that `clear` must invalidate. The session
    /// holds it weakly: the mirror stays registered only while the caller
    /// keeps its `Arc` alive.
    pub fn add_cookie_mirror(&self, mirror: &Arc<dyn CookieMirror>) {
        let mut mirrors = self.cookie_mirrors();
        mirrors.retain(|m| m.strong_count() > 0);
        mirrors.push(Arc::downgrade(mirror));
    }

    /// Current credential; empty when unauthenticated.
    #[must_use]
    pub fn get(&self) -> String {
        self.inner.token.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.inner.token.borrow().is_empty()
    }

    /// Replace the credential and persist it. The value is opaque and not
    /// validated.
    pub fn set(&self, value: impl Into<String>) {
        let value = value.into();
        self.inner.token.send_replace(value.clone());
        if let Err(e) = self.inner.storage.set_item(TOKEN_KEY, &value) {
            tracing::warn!(error = %e, "failed to persist credential");
        }
    }

    /// Drop the credential from memory, durable storage, and every cookie
    /// mirror. Safe to call repeatedly.
    pub fn clear(&self) {
        self.inner.token.send_replace(String::new());
        if let Err(e) = self.inner.storage.remove_item(TOKEN_KEY) {
            tracing::warn!(error = %e, "failed to remove stored credential");
        }
        let mut mirrors = self.cookie_mirrors();
        mirrors.retain(|m| m.strong_count() > 0);
        for mirror in mirrors.iter().filter_map(Weak::upgrade) {
            mirror.expire(TOKEN_KEY);
        }
    }

    /// Observe authentication changes.
    #[must_use]
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch { rx: self.inner.token.subscribe() }
    }

    fn cookie_mirrors(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn CookieMirror>>> {
        self.inner.cookies.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the credential itself.
        f.debug_struct("SessionStore").field("authenticated", &self.is_authenticated()).finish_non_exhaustive()
    }
}

/// Observer of a `SessionStore`. Reads are always current; `changed` waits
/// for the next write.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    rx: watch::Receiver<String>,
}

impl SessionWatch {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.rx.borrow().is_empty()
    }

    /// Wait for the next `set`/`clear` and return the new authenticated flag.
    /// Returns `None` once every handle to the store is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(!self.rx.borrow_and_update().is_empty())
    }
}
