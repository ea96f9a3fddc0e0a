//! Log Reaper (C11) — a `tokio::time::interval` loop, structured like the
//! teacher's `run_daily_cleanup`, deleting log rows past the retention
//! horizon.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

pub struct Reaper {
    pool: PgPool,
    interval: Duration,
    retention_days: i64,
}

impl Reaper {
    pub fn new(pool: PgPool, interval: Duration, retention_days: i64) -> Self {
        Self { pool, interval, retention_days }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.reap_once().await {
                Ok(deleted) => info!(deleted, "log reaper sweep completed"),
                Err(e) => error!(error = %e, "log reaper sweep failed"),
            }
        }
    }

    async fn reap_once(&self) -> Result<u64, sqlx::Error> {
        let cutoff = Utc::now() - chrono::Duration::days(self.retention_days);
        let result = sqlx::query("DELETE FROM log WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
