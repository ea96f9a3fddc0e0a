//! Workflow engine runner: scheduler, executor pool and log reaper.

use std::sync::Arc;
use std::time::Duration;

use engine_runner::config::Config;
use engine_runner::executor::ExecutorPool;
use engine_runner::reaper::Reaper;
use engine_runner::scheduler::Scheduler;
use engine_runner::state::EngineState;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "engine_runner=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let encryption_key = core_credentials::load_master_key()?;

    let pool = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    tracing::info!("connected to database");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("migrations complete");

    let state = EngineState::new(pool, &config, encryption_key)?;

    let scheduler = Scheduler::new(
        Arc::clone(&state.workflows),
        Arc::clone(&state.dedup),
        Arc::clone(&state.queue),
        Arc::clone(&state.dispatcher),
        Arc::clone(&state.event_log),
        Duration::from_secs(config.scheduler_tick_seconds),
    );
    tokio::spawn(scheduler.run());

    let reaper = Reaper::new(state.pool.clone(), Duration::from_secs(config.reaper_interval_seconds), config.log_retention_days);
    tokio::spawn(reaper.run());

    let executor = ExecutorPool::start(
        config.worker_concurrency,
        Arc::clone(&state.queue),
        Arc::clone(&state.workflows),
        Arc::clone(&state.runs),
        Arc::clone(&state.dedup),
        Arc::clone(&state.dispatcher),
        Arc::clone(&state.event_log),
        config.on_terminal_failure,
    );

    tracing::info!(concurrency = config.worker_concurrency, "engine runner started");

    // Block forever; the scheduler and reaper run as detached tasks, the
    // executor pool's workers run inside its own spawned tasks.
    std::future::pending::<()>().await;
    executor.shutdown().await;

    Ok(())
}
