// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, Result};
use deadpool::Runtime;
use diesel::{Connection, PgConnection};
use diesel_async::{pooled_connection::AsyncDieselConnectionManager, AsyncPgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::config::DatabaseConfig;

pub type DbPool = deadpool::managed::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;
pub type DbConnection = deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Connection pool for the Postgres backend
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create the pool, check connectivity and apply pending migrations
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);

        let pool = DbPool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()?;

        let db = Self { pool };

        db.pool
            .get()
            .await
            .map_err(|e| anyhow!("Failed to connect to the database: {}", e))?;
        info!("Successfully connected to the database");

        run_migrations(config.url.clone()).await?;

        Ok(db)
    }

    pub fn into_pool(self) -> DbPool {
        self.pool
    }
}

/// Migrations run on a blocking connection off the async workers
async fn run_migrations(url: String) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = PgConnection::establish(&url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to apply migrations: {}", e))?;
        info!("Database migrations applied ({} new)", applied.len());
        Ok(())
    })
    .await?
}
