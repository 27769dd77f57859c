//! HTTP and WebSocket surface.
//!
//! The router exposes the HIS webhook endpoint, per-user WebSocket
//! connections for notification delivery, an administrative disconnect, and
//! a health probe.

mod error;
mod routes;
mod socket;

pub use error::WebError;
pub use routes::{AppState, create_router};
pub use socket::serve_connection;
