//! JSON line-protocol surface: request envelope, error shapes, and the
//! method router that dispatches onto the domain handlers.

mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::handle_request;
pub use types::{AppState, Request};
