//! Client-side routing: the static route table, the navigation guard, and
//! the history that commits guarded navigations.
//!
//! DESIGN
//! ======
//! `guard::decide` is a pure function of a route and the session's
//! authenticated flag, so it is tested without any router at all.
//! `history::Router` wires it to a `SessionStore` and owns the current
//! location; it also implements `Navigator`, which is how the HTTP gateway
//! forces a trip to the login page.

pub mod guard;
pub mod history;
pub mod routes;

pub use guard::{Decision, decide};
pub use history::{NavigationError, Navigator, Outcome, PendingNavigation, Router};
pub use routes::{DASHBOARD_PATH, LOGIN_PATH, Route, RouteTable, Target, View};
