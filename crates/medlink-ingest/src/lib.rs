//! Webhook update ingestion.
//!
//! Normalized HIS update payloads are validated, written into the cache
//! store, and only then announced to the notification hub. A payload that
//! fails validation never reaches the cache; a payload that fails to cache
//! never produces a notification.

mod error;
mod ingestor;
mod update;

pub use error::IngestError;
pub use ingestor::Ingestor;
pub use update::HisUpdate;
