//! sonlist HTTP server
//!
//! Serves the list and item API over HTTP.
//!
//! Usage:
//!   sonlist-server --port 8080 --config sonlist.toml --db sonlist.db
//!
//! Without `--db` every document lives in memory and is lost on exit.

use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use sonlist_server::build_router;
use sonlist_service::{ItemService, ServiceConfig};
use sonlist_storage::{DocumentStore, MemoryStore, SqliteStore};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sonlist-server")]
#[command(about = "HTTP server for sonlist lists and items")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the TOML config file
    #[arg(short, long, default_value = "sonlist.toml")]
    config: PathBuf,

    /// SQLite database file (in-memory store if omitted)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("sonlist server starting...");
    let config = ServiceConfig::load_from(&args.config);

    let store: Arc<dyn DocumentStore> = match &args.db {
        Some(path) => Arc::new(
            SqliteStore::open(path)
                .with_context(|| format!("Failed to open database {}", path.display()))?,
        ),
        None => {
            warn!("No --db given, documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let service = Arc::new(ItemService::new(store, config));
    let app = build_router(service);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", args.port))?;
    info!("HTTP API listening on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
