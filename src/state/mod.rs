//! Client-side session state.
//!
//! DESIGN
//! ======
//! `session` owns the credential and its observers. `storage` holds the
//! durable backends the session persists through, kept behind a trait so the
//! same session logic runs against a file on disk, browser `localStorage`,
//! or plain memory in tests.

pub mod session;
pub mod storage;
