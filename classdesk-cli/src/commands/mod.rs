//! Command implementations for the classdesk CLI

pub mod heartbeat;
pub mod migrate;
pub mod serve;

pub use heartbeat::run_heartbeat;
pub use migrate::run_migrate;
pub use serve::run_serve;

use anyhow::{Context, Result};
use clap::Args;
use classdesk_server::db::{create_pool_with_options, PgPool, DEFAULT_MAX_CONNECTIONS};

/// Database connection flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Pool size
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    pub async fn connect(&self) -> Result<PgPool> {
        let url = self
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        create_pool_with_options(url, self.max_connections)
            .await
            .context("Failed to create database pool")
    }
}
