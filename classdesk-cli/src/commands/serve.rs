//! HTTP server command
//!
//! Runs the classdesk API with whichever providers the environment configures.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;

use classdesk_server::http::{run_server, ServerConfig};
use classdesk_server::AppConfig;

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "CLASSDESK_BIND", default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Apply pending migrations before accepting requests
    #[arg(long)]
    pub migrate: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    tracing::info!("Starting classdesk server on {}", args.bind);

    let pool = args.database.connect().await?;
    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        run_migrations: args.migrate,
    };

    run_server(pool, AppConfig::from_env(), config)
        .await
        .context("Server error")?;

    Ok(())
}
