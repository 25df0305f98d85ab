use clap::Parser;
use std::sync::Arc;
use tracing::info;

use ams_api::observability::logging::init_logging;
use ams_api::server;
use ams_core::storage::{DatabaseStorage, Storage};
use ams_core::DatabaseManager;

#[derive(Parser)]
#[command(name = "ams-api")]
#[command(about = "HTTP API server for the artisan marketplace")]
#[command(version = "0.1.0")]
struct Cli {
    /// Port to run the server on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Use a local database file instead of the remote Turso database
    #[arg(long)]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    init_logging();

    println!("🚀 Starting artisan marketplace API on port {}...", cli.port);

    // Initialize database storage
    info!("Initializing database storage...");
    let db_manager = match cli.db_path.as_deref() {
        Some(path) => DatabaseManager::new_local(path).await?,
        None => DatabaseManager::new().await?,
    };
    db_manager.run_migrations().await?;
    let storage: Arc<dyn Storage> = Arc::new(DatabaseStorage::new(db_manager));
    info!("Database storage initialized successfully");

    // Start the server
    server::start_server(storage, cli.port).await?;

    Ok(())
}
