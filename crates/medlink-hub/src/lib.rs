//! Real-time notification hub.
//!
//! Owns the registry of connected staff clients and fans change
//! notifications out to every registered connection. All registry mutations
//! are serialized through a single control loop, so register, unregister
//! and broadcast behave as if atomic and totally ordered relative to each
//! other; no caller ever touches the registry directly.

mod hub;
mod message;

pub use hub::{Hub, HubConfig, HubError, Registration};
pub use message::Notification;
