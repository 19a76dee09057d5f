//! Navigation guard.
//!
//! Runs before every navigation. Anonymous users are kept on the login page;
//! signed-in users are kept off it. Routes without an explicit requirement
//! are treated as protected.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::routes::{DASHBOARD_PATH, LOGIN_PATH, Route};

/// Result of guarding one navigation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Proceed to the requested target unchanged.
    Allow,
    /// Abandon the requested target and go here instead.
    Redirect(&'static str),
}

/// Guard a navigation to `route` (`None` for a path with no route).
#[must_use]
pub fn decide(route: Option<&Route>, authenticated: bool) -> Decision {
    let requires_auth = route.and_then(|r| r.requires_auth);
    match (requires_auth, authenticated) {
        (Some(false), true) => Decision::Redirect(DASHBOARD_PATH),
        (None | Some(true), false) => Decision::Redirect(LOGIN_PATH),
        _ => Decision::Allow,
    }
}
