//! Periodic reconciliation against the HIS.
//!
//! Webhooks can be missed; the reconciler pulls the full patient list on an
//! interval and rewrites the cached copy, bounding how stale the cache can
//! get regardless of push delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use medlink_cache::{CacheStore, keys};

use crate::{HisClient, ReconcileError};

/// Reconciler tuning knobs.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Time between pulls.
    pub interval: Duration,
    /// TTL applied to the refreshed patient list.
    pub ttl: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            ttl: keys::DEFAULT_TTL,
        }
    }
}

/// Interval worker that refreshes the cached patient list from the HIS.
pub struct Reconciler {
    client: HisClient,
    cache: Arc<dyn CacheStore>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(client: HisClient, cache: Arc<dyn CacheStore>, config: ReconcilerConfig) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    /// Run until `shutdown_rx` flips to `true`.
    ///
    /// A failed pass is logged and the loop keeps its cadence. The pull runs
    /// inline in the loop, so a pass that outlasts the interval delays the
    /// next tick instead of overlapping it; `MissedTickBehavior::Skip` then
    /// drops the ticks that piled up behind it.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?self.config.interval, "reconciler started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.reconcile_once().await {
                        error!(error = %e, "reconciliation pass failed");
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("reconciler shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One full pull-and-rewrite pass.
    pub async fn reconcile_once(&self) -> Result<(), ReconcileError> {
        let patients = self.client.fetch_patients().await?;
        debug!(count = patients.len(), "fetched authoritative patient list");

        let value = serde_json::to_vec(&patients)
            .map_err(medlink_cache::CacheError::from)?;
        self.cache
            .set(keys::PATIENT_LIST, value, self.config.ttl)
            .await?;

        info!(count = patients.len(), "patient list reconciled");
        Ok(())
    }
}
