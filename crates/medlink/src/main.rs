//! Medlink: clinic administration backend.
//!
//! Keeps a TTL cache in sync with the hospital information system (push via
//! webhook, pull via periodic reconciliation) and fans updates out to
//! connected clinic workstations over WebSockets.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod serve;

#[derive(Parser)]
#[command(name = "medlink")]
#[command(about = "Clinic administration backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server (webhook intake, WebSocket hub, reconciliation)
    Serve {
        /// Address to listen on
        #[arg(long, env = "MEDLINK_LISTEN", default_value = "0.0.0.0:8080")]
        listen: SocketAddr,

        /// Base URL of the hospital information system API
        #[arg(long, env = "MEDLINK_HIS_URL")]
        his_url: String,

        /// Seconds between reconciliation pulls
        #[arg(long, env = "MEDLINK_RECONCILE_INTERVAL", default_value = "600")]
        reconcile_interval: u64,

        /// Hours cached entries live before expiring
        #[arg(long, env = "MEDLINK_CACHE_TTL_HOURS", default_value = "24")]
        cache_ttl_hours: u64,

        /// Per-client notification queue capacity
        #[arg(long, env = "MEDLINK_CLIENT_QUEUE_CAPACITY", default_value = "32")]
        client_queue_capacity: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "medlink=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            his_url,
            reconcile_interval,
            cache_ttl_hours,
            client_queue_capacity,
        } => {
            serve::run(serve::ServeConfig {
                listen,
                his_url,
                reconcile_interval,
                cache_ttl_hours,
                client_queue_capacity,
            })
            .await
        }
    }
}
