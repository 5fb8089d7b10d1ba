//! Content-serving adaptor.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌───────────────────────────────────────────────┐
//!     ───────────────────┼─▶ http::server ─▶ http::bridge ─▶ Exchange    │
//!                        │                                     │         │
//!                        │                                     ▼         │
//!                        │                     handler::Handler::handle  │
//!                        │                                     │         │
//!                        │                                     ▼         │
//!                        │                      adaptor (StaticDocuments)│
//!     Client Response    │                                     │         │
//!     ◀──────────────────┼── streamed body ◀── ResponseSink ◀──┘         │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use adaptor_handler::adaptor::StaticDocuments;
use adaptor_handler::config::{load_config, AdaptorConfig};
use adaptor_handler::observability::{logging, metrics};
use adaptor_handler::{AdaptorServer, Handler, Shutdown};

#[derive(Parser)]
#[command(name = "adaptor-handler")]
#[command(about = "Serve documents to an indexing system over HTTP", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AdaptorConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("adaptor-handler v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        fallback_hostname = %config.handler.fallback_hostname,
        text_encoding = %config.handler.text_encoding,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let documents = StaticDocuments::from_config(&config.documents)?;
    if documents.is_empty() {
        tracing::warn!("No documents configured; every request will get 404");
    } else {
        tracing::info!(documents = documents.len(), "Documents loaded");
    }
    let handler = Arc::new(Handler::new(config.handler.clone(), documents)?);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = AdaptorServer::new(config.server.clone(), handler);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
