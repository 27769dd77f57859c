//! Ingest pipeline: validate, cache, then notify.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use medlink_cache::{CacheError, CacheStore, keys};
use medlink_hub::{Hub, Notification};

use crate::{HisUpdate, IngestError};

/// Ingests HIS webhook updates into the cache and notifies connected clients.
#[derive(Clone)]
pub struct Ingestor {
    cache: Arc<dyn CacheStore>,
    hub: Hub,
    ttl: Duration,
}

impl Ingestor {
    pub fn new(cache: Arc<dyn CacheStore>, hub: Hub, ttl: Duration) -> Self {
        Self { cache, hub, ttl }
    }

    /// Ingest one update.
    ///
    /// The cache write happens strictly before the broadcast: a write that
    /// fails returns the error and no notification is produced for data
    /// that was never cached.
    pub async fn ingest(&self, update: HisUpdate) -> Result<(), IngestError> {
        validate(&update)?;

        match &update {
            HisUpdate::Reception {
                call_id,
                receptions,
            } => {
                let value = serde_json::to_vec(receptions).map_err(CacheError::from)?;
                self.cache
                    .set(&keys::receptions(*call_id), value, self.ttl)
                    .await?;
            }
            HisUpdate::PatientList { patients } => {
                // The whole collection is one atomic replace; incremental
                // writes would break the no-merge cache contract.
                let value = serde_json::to_vec(patients).map_err(CacheError::from)?;
                self.cache.set(keys::PATIENT_LIST, value, self.ttl).await?;
            }
            HisUpdate::MedCard { patient_id, card } => {
                let value = serde_json::to_vec(card).map_err(CacheError::from)?;
                self.cache
                    .set(&keys::med_card(*patient_id), value, self.ttl)
                    .await?;
            }
            HisUpdate::AuthSync { patient_id } => {
                // The stale card is dropped rather than rewritten; the next
                // read misses and re-pulls from the HIS.
                self.cache.delete(&keys::med_card(*patient_id)).await?;
            }
        }

        let notification = notification_for(&update);
        info!(
            reference = update.reference(),
            reference_id = update.reference_id(),
            broadcast_uuid = %notification.broadcast_uuid,
            "update cached, broadcasting"
        );
        if let Err(e) = self.hub.broadcast(notification).await {
            // The data is already cached and delivery is fire-and-forget; a
            // missing hub must not fail the webhook.
            debug!(error = %e, "no hub to notify");
        }
        Ok(())
    }
}

fn validate(update: &HisUpdate) -> Result<(), IngestError> {
    match update {
        HisUpdate::Reception { call_id: 0, .. } => Err(IngestError::Validation(
            "reception update without call_id".into(),
        )),
        HisUpdate::MedCard { patient_id: 0, .. } | HisUpdate::AuthSync { patient_id: 0 } => Err(
            IngestError::Validation("patient update without patient_id".into()),
        ),
        HisUpdate::PatientList { patients } if patients.is_null() => Err(IngestError::Validation(
            "patient list update without patients".into(),
        )),
        _ => Ok(()),
    }
}

fn notification_for(update: &HisUpdate) -> Notification {
    let (header, text) = match update {
        HisUpdate::Reception { call_id, .. } => (
            "Receptions updated",
            format!("Reception set for call {call_id} changed"),
        ),
        HisUpdate::PatientList { .. } => (
            "Patient list updated",
            "The patient list was refreshed".to_string(),
        ),
        HisUpdate::MedCard { patient_id, .. } => (
            "Medical card updated",
            format!("Medical card for patient {patient_id} changed"),
        ),
        HisUpdate::AuthSync { patient_id } => (
            "Patient session synced",
            format!("Cached data for patient {patient_id} was invalidated"),
        ),
    };
    Notification::new(
        header,
        text,
        update.type_id(),
        update.reference(),
        update.reference_id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medlink_cache::MemoryStore;
    use medlink_hub::HubConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::mpsc::error::TryRecvError;

    const TTL: Duration = Duration::from_secs(60);

    /// Cache stand-in whose backend is always unreachable.
    struct UnavailableStore;

    #[async_trait]
    impl CacheStore for UnavailableStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set(
            &self,
            _key: &str,
            _value: Vec<u8>,
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    fn ingestor_with_memory_store() -> (Ingestor, Arc<MemoryStore>, Hub) {
        let cache = Arc::new(MemoryStore::new());
        let hub = Hub::spawn(HubConfig::default());
        let ingestor = Ingestor::new(cache.clone(), hub.clone(), TTL);
        (ingestor, cache, hub)
    }

    #[tokio::test]
    async fn valid_reception_update_is_cached_and_broadcast_to_all_clients() {
        let (ingestor, cache, hub) = ingestor_with_memory_store();
        let mut u1 = hub.register(1).await.unwrap();
        let mut u2 = hub.register(2).await.unwrap();

        let receptions = json!([{"slot": "09:00", "doctor_id": 3}]);
        ingestor
            .ingest(HisUpdate::Reception {
                call_id: 11,
                receptions: receptions.clone(),
            })
            .await
            .unwrap();

        let cached = cache.get("receptions:11").await.unwrap().unwrap();
        assert_eq!(cached, serde_json::to_vec(&receptions).unwrap());

        let got_1 = u1.queue.recv().await.unwrap();
        let got_2 = u2.queue.recv().await.unwrap();
        assert_eq!(got_1.reference_id, 11);
        assert_eq!(got_1.reference, "receptions");
        assert_eq!(got_1, got_2);
    }

    #[tokio::test]
    async fn missing_identifier_is_a_validation_error_with_no_side_effects() {
        let (ingestor, cache, hub) = ingestor_with_memory_store();
        let mut client = hub.register(1).await.unwrap();

        let result = ingestor
            .ingest(HisUpdate::Reception {
                call_id: 0,
                receptions: json!([]),
            })
            .await;

        assert!(matches!(result, Err(IngestError::Validation(_))));
        assert_eq!(cache.get("receptions:0").await.unwrap(), None);
        assert!(matches!(
            client.queue.try_recv(),
            Err(TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn cache_failure_suppresses_the_broadcast() {
        let hub = Hub::spawn(HubConfig::default());
        let ingestor = Ingestor::new(Arc::new(UnavailableStore), hub.clone(), TTL);
        let mut client = hub.register(1).await.unwrap();

        let result = ingestor
            .ingest(HisUpdate::Reception {
                call_id: 5,
                receptions: json!([]),
            })
            .await;

        assert!(matches!(
            result,
            Err(IngestError::Cache(CacheError::Unavailable(_)))
        ));
        assert!(matches!(
            client.queue.try_recv(),
            Err(TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn patient_list_update_replaces_the_whole_collection() {
        let (ingestor, cache, _hub) = ingestor_with_memory_store();

        ingestor
            .ingest(HisUpdate::PatientList {
                patients: json!([{"id": 1}, {"id": 2}]),
            })
            .await
            .unwrap();
        ingestor
            .ingest(HisUpdate::PatientList {
                patients: json!([{"id": 3}]),
            })
            .await
            .unwrap();

        let cached = cache.get("patientlist").await.unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&cached).unwrap();
        assert_eq!(parsed, json!([{"id": 3}]));
    }

    #[tokio::test]
    async fn auth_sync_invalidates_the_cached_card_and_still_notifies() {
        let (ingestor, cache, hub) = ingestor_with_memory_store();
        let mut client = hub.register(1).await.unwrap();

        ingestor
            .ingest(HisUpdate::MedCard {
                patient_id: 8,
                card: json!({"allergies": []}),
            })
            .await
            .unwrap();
        client.queue.recv().await.unwrap();

        ingestor
            .ingest(HisUpdate::AuthSync { patient_id: 8 })
            .await
            .unwrap();

        assert_eq!(cache.get("medcard:8").await.unwrap(), None);
        let got = client.queue.recv().await.unwrap();
        assert_eq!(got.type_id, 4);
        assert_eq!(got.reference_id, 8);
    }
}
