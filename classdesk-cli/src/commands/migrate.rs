//! Apply pending schema migrations and exit

use anyhow::{Context, Result};
use clap::Parser;

use classdesk_server::db::run_migrations;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let pool = args.database.connect().await?;
    run_migrations(&pool)
        .await
        .context("Failed to apply migrations")?;
    pool.close().await;
    Ok(())
}
