//! Cache store contract and the in-memory implementation.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use crate::CacheError;

/// Key-value store with per-key time-to-live.
///
/// Implementations must report an expired key identically to an absent one:
/// callers cannot distinguish "never existed" from "expired". Overwriting a
/// key fully replaces the prior value and resets its TTL; there is no
/// append or merge semantic, so collection-valued entries are written whole.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a key. `Ok(None)` covers both absent and expired entries;
    /// `Err` is reserved for backend failures.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value under `key`, replacing any prior value and TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory cache store.
///
/// Expiry is passive: it is checked on read and stale entries are dropped
/// there, with no sweeper task. Safe for concurrent use by the ingest and
/// reconciliation paths since every write is a full-key replace
/// (last-write-wins at the key level).
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries, for diagnostics.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|e| e.value().expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at <= Instant::now() {
            drop(entry);
            // Re-check under the entry lock so a concurrent overwrite with a
            // fresh TTL is not dropped.
            self.entries
                .remove_if(key, |_, e| e.expires_at <= Instant::now());
            trace!(key, "cache: entry expired");
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        trace!(key, "cache: entry set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        if self.entries.remove(key).is_some() {
            trace!(key, "cache: entry deleted");
        }
        Ok(())
    }
}
