// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelbook_social::api::{self, AppState};
use reelbook_social::config::{Config, StoreBackend};
use reelbook_social::db::Database;
use reelbook_social::store::{MemoryStore, PgStore, SocialStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reelbook_social=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::init()?;
    info!("Initialized configuration");

    let store: Arc<dyn SocialStore> = match config.store {
        StoreBackend::Postgres => {
            let db = Database::new(&config.database).await?;
            info!("Connected to database");
            Arc::new(PgStore::new(db.into_pool()))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    };

    if let Err(e) = api::start_api_server(AppState::new(store), config, shutdown).await {
        error!("API server error: {}", e);
        return Err(e);
    }

    info!("Reelbook social service shutdown complete");
    Ok(())
}
