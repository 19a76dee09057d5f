//! Network layer.
//!
//! ARCHITECTURE
//! ============
//! `gateway` is the only place that talks HTTP. `api` builds the console's
//! auth calls on top of it, and `types` holds the wire shapes both share.

pub mod api;
pub mod error;
pub mod gateway;
pub mod types;

pub use error::RequestError;
pub use gateway::{ApiRequest, ApiResponse, Gateway};
