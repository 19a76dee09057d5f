//! # hub-shell
//!
//! Client-side session shell for the bench-hub console.
//!
//! DESIGN
//! ======
//! Three parts cooperate around one credential:
//! - `state::session` holds the bearer token and persists it.
//! - `net::gateway` injects the token into outbound calls and drops the
//!   session when the server answers 401.
//! - `router` decides every navigation from the route table and the
//!   session's authenticated flag.
//!
//! The session is an explicit handle passed to the gateway and the router
//! rather than a global, so tests can build as many isolated sessions as
//! they like.

pub mod config;
pub mod net;
pub mod router;
pub mod state;
