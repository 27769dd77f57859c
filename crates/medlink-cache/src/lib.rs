//! TTL key-value cache for externally-sourced clinic data.
//!
//! Holds the latest known patient list, per-patient medical cards, and
//! per-call reception sets pushed by the hospital information system.
//! Entries expire passively by TTL; an expired key reads the same as one
//! that never existed.

mod error;
pub mod keys;
mod store;

pub use error::CacheError;
pub use store::{CacheStore, MemoryStore};
