// Address Import - Web Server
// REST API for preview/finalize with Axum

use address_import::api::{router, AppState};
use address_import::config::DEFAULT_BIND_ADDR;
use address_import::{logging, Config, EntityStore, SqliteStagingStore};
use anyhow::{Context, Result};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "address-import-server")]
#[command(about = "HTTP API for staging and importing address CSV files")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: Config,

    /// Address to listen on
    #[arg(long, env = "ADDRESS_IMPORT_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();
    let args = Args::parse();

    let staging = SqliteStagingStore::open(&args.config.database)
        .with_context(|| format!("Failed to open database {:?}", args.config.database))?;
    let store = EntityStore::open(&args.config.database)
        .with_context(|| format!("Failed to open database {:?}", args.config.database))?;
    info!(database = ?args.config.database, "database opened");

    let app = router(AppState::new(staging, store))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    info!(addr = %args.bind, "server running");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
