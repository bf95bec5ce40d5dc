//! Heartbeat command
//!
//! `--once` writes a single row and exits, for use from cron. Without it the
//! command keeps beating until interrupted.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use classdesk_server::http::shutdown_signal;
use classdesk_server::jobs::heartbeat;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct HeartbeatArgs {
    /// Write one heartbeat and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds between heartbeats
    #[arg(
        long,
        default_value_t = heartbeat::DEFAULT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

pub async fn run_heartbeat(args: HeartbeatArgs) -> Result<()> {
    let pool = args.database.connect().await?;

    if args.once {
        let entry = heartbeat::beat(&pool)
            .await
            .context("Failed to write heartbeat")?;
        println!("{} {}", entry.id, entry.message);
        return Ok(());
    }

    let period = Duration::from_secs(args.interval_secs);
    tracing::info!(interval_secs = args.interval_secs, "heartbeat loop started");
    let beats = heartbeat::run_every(&pool, period, shutdown_signal()).await;
    pool.close().await;

    if beats.written == 0 && beats.failed > 0 {
        anyhow::bail!("every heartbeat failed ({} attempts)", beats.failed);
    }
    Ok(())
}
