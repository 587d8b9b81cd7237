//! ROLLCALL Server — Application entry point.
//!
//! Bootstraps logging, connects to SurrealDB, and brings the schema
//! up to date. The check-in and issuing flows live in
//! `rollcall-attend` and are wired up by the embedding application;
//! this binary owns the shared infrastructure.

use std::env;

use rollcall_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn db_config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: env_or("ROLLCALL_DB_URL", &defaults.url),
        namespace: env_or("ROLLCALL_DB_NS", &defaults.namespace),
        database: env_or("ROLLCALL_DB_NAME", &defaults.database),
        username: env_or("ROLLCALL_DB_USER", &defaults.username),
        password: env_or("ROLLCALL_DB_PASS", &defaults.password),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rollcall=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting ROLLCALL server...");

    let config = db_config_from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!(error = %err, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(err) = rollcall_db::run_migrations(manager.client()).await {
        tracing::error!(error = %err, "Schema migration failed");
        std::process::exit(1);
    }

    tracing::info!("ROLLCALL server ready.");

    // TODO: Start REST API server for issuing and check-in

    tracing::info!("ROLLCALL server stopped.");
}
