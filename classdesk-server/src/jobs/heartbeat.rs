//! Heartbeat job
//!
//! Writes one row to `logs` per run so that an external monitor can tell
//! the scheduler and the database are both alive.

use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use tokio::time::MissedTickBehavior;

use crate::db::{DbError, LogEntry, LogRepo};

/// `logs.source` for heartbeat rows
pub const SOURCE: &str = "heartbeat";

/// Default period between runs
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Write a single heartbeat row.
pub async fn beat(pool: &PgPool) -> Result<LogEntry, DbError> {
    let message = format!("classdesk {} alive", env!("CARGO_PKG_VERSION"));
    let entry = LogRepo::new(pool).insert(SOURCE, &message).await?;
    tracing::info!(log_id = entry.id, "heartbeat written");
    Ok(entry)
}

/// Outcome counts for a heartbeat loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Beats {
    pub written: u64,
    pub failed: u64,
}

/// Beat every `period` until `shutdown` resolves.
///
/// The first beat happens immediately. A failed beat is logged and the loop
/// carries on.
pub async fn run_every<F>(pool: &PgPool, period: Duration, shutdown: F) -> Beats
where
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut beats = Beats::default();
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(written = beats.written, failed = beats.failed, "heartbeat stopped");
                return beats;
            }
            _ = interval.tick() => {
                match beat(pool).await {
                    Ok(_) => beats.written += 1,
                    Err(e) => {
                        beats.failed += 1;
                        tracing::error!(error = %e, "heartbeat failed");
                    }
                }
            }
        }
    }
}
