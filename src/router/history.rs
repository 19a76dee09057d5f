//! Guarded navigation and the current location.
//!
//! DESIGN
//! ======
//! A navigation is split into `begin` (resolve redirects and run the guard)
//! and `commit` (move the location). Every `begin` takes a generation
//! ticket; `commit` only lands if no later navigation has begun since. That
//! gives "last write wins" when guard evaluations overlap, the same way a
//! browser router cancels a superseded transition.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::guard::{Decision, decide};
use super::routes::{ROOT_PATH, Route, RouteTable, Target, View, normalize_path};
use crate::state::session::SessionStore;

/// Upper bound on redirects followed by one navigation.
const MAX_REDIRECTS: usize = 8;

/// Something that owns a current location and can be sent elsewhere.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn push(&self, path: &str);
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("too many redirects navigating to {path}")]
    RedirectLoop { path: String },
}

/// Final state of one navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Location moved to `path`. `view` is `None` when no route matched.
    Arrived { path: String, view: Option<View>, redirected: bool },
    /// A later navigation began before this one could commit.
    Superseded,
}

/// A guarded navigation waiting to be committed.
#[derive(Debug)]
#[must_use = "a pending navigation does nothing until committed"]
pub struct PendingNavigation {
    ticket: u64,
    requested: String,
    path: String,
    view: Option<View>,
}

impl PendingNavigation {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.path != self.requested
    }
}

#[derive(Debug)]
struct Location {
    path: String,
    view: Option<View>,
    entries: Vec<String>,
}

/// Route table + session + current location.
#[derive(Debug)]
pub struct Router {
    routes: RouteTable,
    session: SessionStore,
    generation: AtomicU64,
    location: Mutex<Location>,
}

impl Router {
    #[must_use]
    pub fn new(routes: RouteTable, session: SessionStore) -> Self {
        Self {
            routes,
            session,
            generation: AtomicU64::new(0),
            location: Mutex::new(Location { path: ROOT_PATH.to_owned(), view: None, entries: Vec::new() }),
        }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Resolve and commit in one step.
    ///
    /// # Errors
    ///
    /// Returns `RedirectLoop` if the route table and guard keep bouncing.
    pub fn navigate(&self, to: &str) -> Result<Outcome, NavigationError> {
        let pending = self.begin(to)?;
        Ok(self.commit(pending))
    }

    /// Resolve static redirects and run the guard against the session as it
    /// is right now. Supersedes every navigation begun earlier.
    ///
    /// # Errors
    ///
    /// Returns `RedirectLoop` after `MAX_REDIRECTS` hops.
    pub fn begin(&self, to: &str) -> Result<PendingNavigation, NavigationError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let requested = normalize_path(to);
        let mut path = requested.clone();

        for _ in 0..MAX_REDIRECTS {
            let route = self.routes.find(&path);
            if let Some(Target::Redirect(next)) = route.map(|r| r.target) {
                path = next.to_owned();
                continue;
            }
            match decide(route, self.session.is_authenticated()) {
                Decision::Allow => {
                    let view = route.and_then(Route::view_kind);
                    return Ok(PendingNavigation { ticket, requested, path, view });
                }
                Decision::Redirect(next) => {
                    tracing::debug!(from = %path, to = next, "guard redirect");
                    path = next.to_owned();
                }
            }
        }

        tracing::warn!(path = %requested, "navigation redirect loop");
        Err(NavigationError::RedirectLoop { path: requested })
    }

    /// Move the location unless a later navigation has begun.
    pub fn commit(&self, pending: PendingNavigation) -> Outcome {
        let mut location = self.location();
        if self.generation.load(Ordering::SeqCst) != pending.ticket {
            tracing::debug!(path = %pending.path, "navigation superseded");
            return Outcome::Superseded;
        }
        let redirected = pending.is_redirect();
        location.path.clone_from(&pending.path);
        location.view = pending.view;
        location.entries.push(pending.path.clone());
        Outcome::Arrived { path: pending.path, view: pending.view, redirected }
    }

    #[must_use]
    pub fn current_view(&self) -> Option<View> {
        self.location().view
    }

    /// Every committed location, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.location().entries.clone()
    }

    fn location(&self) -> std::sync::MutexGuard<'_, Location> {
        self.location.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Navigator for Router {
    fn current_path(&self) -> String {
        self.location().path.clone()
    }

    fn push(&self, path: &str) {
        if let Err(e) = self.navigate(path) {
            tracing::warn!(error = %e, "forced navigation failed");
        }
    }
}

// =============================================================================
// BROWSER
// =============================================================================

#[cfg(feature = "browser")]
pub use browser::WindowLocation;

#[cfg(feature = "browser")]
mod browser {
    use super::Navigator;

    /// `window.location` of the current page. Pushing performs a full page
    /// load so the host router re-runs its own guard.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowLocation;

    impl Navigator for WindowLocation {
        fn current_path(&self) -> String {
            web_sys::window()
                .and_then(|w| w.location().pathname().ok())
                .unwrap_or_default()
        }

        fn push(&self, path: &str) {
            if let Some(window) = web_sys::window() {
                let _ = window.location().set_href(path);
            }
        }
    }
}
