use crate::common::error::{MarketError, Result};
use libsql::{Builder, Connection, Database};
use std::env;
use tracing::info;

pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Create a new database manager with a connection to Turso.
    pub async fn new() -> Result<Self> {
        let url = env::var("LIBSQL_URL").map_err(|_| MarketError::Database {
            message: "LIBSQL_URL environment variable not set".to_string(),
        })?;

        let auth_token = env::var("LIBSQL_AUTH_TOKEN").map_err(|_| MarketError::Database {
            message: "LIBSQL_AUTH_TOKEN environment variable not set".to_string(),
        })?;

        info!("Connecting to Turso database at {}", url);

        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| MarketError::Database {
                message: format!("Failed to connect to database: {e}"),
            })?;

        Ok(Self { db })
    }

    /// Create a database manager backed by a local file (development use).
    pub async fn new_local(path: &str) -> Result<Self> {
        info!("Opening local database at {}", path);

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| MarketError::Database {
                message: format!("Failed to open local database: {e}"),
            })?;

        Ok(Self { db })
    }

    /// Get a connection to the database
    pub async fn get_connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| MarketError::Database {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;

        // Apply base schema
        let migration_sql_001 = include_str!("../migrations/001_create_marketplace_tables.sql");
        conn.execute_batch(migration_sql_001)
            .await
            .map_err(|e| MarketError::Database {
                message: format!("Failed to run base migration: {e}"),
            })?;

        // Apply indexes and PRAGMAs
        let migration_sql_002 = include_str!("../migrations/002_indexes_and_pragmas.sql");
        conn.execute_batch(migration_sql_002)
            .await
            .map_err(|e| MarketError::Database {
                message: format!("Failed to run index migration: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}
