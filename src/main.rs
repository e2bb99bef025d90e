//! Tài/Xỉu settlement server binary

use clap::Parser;
use std::sync::Arc;
use taixiu::{
    api::{init_tracing, ApiServer, AppState},
    config::ConfigLoader,
    games::SecureDraw,
    ledger::RocksLedgerStore,
};

#[derive(Parser, Debug)]
#[command(name = "taixiu-server")]
#[command(about = "Tai/Xiu three-dice bet settlement server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Listen host (overrides config and environment)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config and environment)
    #[arg(long)]
    port: Option<u16>,

    /// Database directory (overrides config and environment)
    #[arg(long)]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(db_path) = args.db_path {
        config.storage.data_directory = db_path;
    }
    config.validate()?;

    init_tracing(&config.monitoring.log_level);

    tracing::info!("Opening ledger database: {}", config.storage.data_directory);
    let store = Arc::new(RocksLedgerStore::open(&config.storage)?);

    let state = Arc::new(AppState::new(&config, store, Arc::new(SecureDraw)));
    ApiServer::new(config, state).run().await
}
