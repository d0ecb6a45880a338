//! carepath-sync - periodic calendar sync daemon.
//!
//! Pushes pending reminder events to the remote calendar on a fixed
//! interval. Run alongside the API process:
//!
//!   CAREPATH__DATABASE__URL=postgres://... carepath-sync
//!
//! The interval defaults to five minutes and is configurable via
//! `CAREPATH__SYNC__INTERVAL_MINUTES`.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carepath::adapters::calendar::{CalendarApiConfig, HttpCalendarAdapter};
use carepath::adapters::postgres::{
    PostgresCalendarAccountReader, PostgresReminderRepository,
};
use carepath::application::SyncPendingHandler;
use carepath::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,carepath=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let handler = SyncPendingHandler::new(
        Arc::new(PostgresReminderRepository::new(pool.clone())),
        Arc::new(PostgresCalendarAccountReader::new(pool.clone())),
        Arc::new(HttpCalendarAdapter::new(CalendarApiConfig::new(
            config.sync.calendar_base_url.clone(),
        ))),
    );

    info!(
        interval_minutes = config.sync.interval_minutes,
        "Calendar sync daemon started"
    );

    let mut ticker = tokio::time::interval(config.sync.interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match handler.handle(None).await {
                    Ok(report) => {
                        if report.synced > 0 || report.failed > 0 {
                            info!(
                                synced = report.synced,
                                failed = report.failed,
                                "Sync run complete"
                            );
                        }
                    }
                    Err(err) => {
                        error!(error = %err, "Sync run failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received; stopping sync daemon");
                break;
            }
        }
    }

    pool.close().await;
    Ok(())
}
