// This is the entry point of the article engine's command line.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage- and interface-agnostic)
// - `infra/` = Implementations of core traits (in-memory, JSON file, SQLite)
// - `console/` = Command line adapter (argument parsing, output formatting)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested command and map failures to exit codes

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "console/console_layer.rs"]
mod console;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::{AppConfig, StoreBackend};
use crate::console::commands::SharedStore;
use crate::console::{execute, render, Cli, Data};
use crate::core::articles::EngagementService;
use crate::infra::articles::{InMemoryArticleStore, JsonArticleStore, SqliteArticleStore};
use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

/// Open the configured storage backend.
async fn open_store(config: &AppConfig) -> anyhow::Result<SharedStore> {
    if config.store != StoreBackend::Memory {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.data_dir.display())
        })?;
    }

    let store: SharedStore = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; nothing will be kept after exit");
            Arc::new(InMemoryArticleStore::new())
        }
        StoreBackend::Json => {
            let path = config.json_path();
            let store = JsonArticleStore::new(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            Arc::new(store)
        }
        StoreBackend::Sqlite => {
            let path = config.sqlite_path();
            let store = SqliteArticleStore::new(&path.to_string_lossy())
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Arc::new(store)
        }
    };

    tracing::debug!(backend = ?config.store, "Article store ready");
    Ok(store)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();
    let config = AppConfig::from_env();

    // Logs go to stderr so command output can be piped
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    let cli = Cli::parse();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            return ExitCode::from(1);
        }
    };
    let engagement = EngagementService::new_with_config(Arc::clone(&store), config.engagement.clone());
    let data = Data::new(store, engagement);

    let session = cli.session();
    let reply = match execute(&data, session, cli.command).await {
        Ok(reply) => reply,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(err.exit_code());
        }
    };

    match render(&reply, cli.json) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: failed to render output: {}", err);
            ExitCode::from(1)
        }
    }
}
