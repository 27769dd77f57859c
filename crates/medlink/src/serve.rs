//! Server wiring: cache, hub, ingestor, reconciler, and the HTTP listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use miette::{IntoDiagnostic, Result};
use tokio::sync::watch;
use tracing::info;

use medlink_cache::MemoryStore;
use medlink_his::{HisClient, Reconciler, ReconcilerConfig};
use medlink_hub::{Hub, HubConfig};
use medlink_ingest::Ingestor;
use medlink_web::create_router;

pub struct ServeConfig {
    pub listen: SocketAddr,
    pub his_url: String,
    pub reconcile_interval: u64,
    pub cache_ttl_hours: u64,
    pub client_queue_capacity: usize,
}

pub async fn run(config: ServeConfig) -> Result<()> {
    let ttl = Duration::from_secs(config.cache_ttl_hours * 3600);

    let cache = Arc::new(MemoryStore::new());
    let hub = Hub::spawn(HubConfig {
        client_queue_capacity: config.client_queue_capacity,
        ..HubConfig::default()
    });
    let ingestor = Ingestor::new(cache.clone(), hub.clone(), ttl);

    // Shutdown fan-out: ctrl-c flips the watch, everything else follows.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    let his_client = HisClient::new(config.his_url.clone()).into_diagnostic()?;
    let reconciler = Reconciler::new(
        his_client,
        cache.clone(),
        ReconcilerConfig {
            interval: Duration::from_secs(config.reconcile_interval),
            ttl,
        },
    );
    let reconciler_handle = {
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move { reconciler.run(shutdown_rx).await })
    };

    let router = create_router(hub, ingestor);
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .into_diagnostic()?;
    info!(listen = %config.listen, his = %config.his_url, "medlink listening");

    let mut shutdown_rx_http = shutdown_rx.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            // Already-flipped or flipped-later both resolve here.
            while !*shutdown_rx_http.borrow() {
                if shutdown_rx_http.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .into_diagnostic()?;

    reconciler_handle.await.into_diagnostic()?;
    info!("medlink stopped");
    Ok(())
}
