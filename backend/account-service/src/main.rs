/// Account Service Main Entry Point
///
/// Starts with:
/// - PostgreSQL connection pool and migrations
/// - Kafka event producer (optional)
/// - Email service (SMTP or no-op)
use account_service::{config::Settings, AppState};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "account_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Account Service");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let state = AppState::initialize(db_pool, settings)?;
    info!(
        topic = %state.settings.kafka.user_activated_topic,
        "Account service ready"
    );

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    state.db.close().await;
    info!("Account service stopped");
    Ok(())
}
