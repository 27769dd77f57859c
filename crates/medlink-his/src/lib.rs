//! Hospital information system integration.
//!
//! [`HisClient`] pulls the authoritative patient list over HTTP;
//! [`Reconciler`] runs that pull on an interval and refreshes the cache so
//! missed webhooks converge back to the HIS state within one period.

mod client;
mod error;
mod reconciler;

pub use client::{HisClient, Patient};
pub use error::{HisError, ReconcileError};
pub use reconciler::{Reconciler, ReconcilerConfig};
