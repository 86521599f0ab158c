//! Postgres pool setup

use std::time::{Duration, Instant};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use crate::config::settings::DatabaseConfig as DatabaseSettings;
use crate::utils::errors::OpenHouseError;

pub type DatabasePool = Pool<Postgres>;

/// Pool options resolved from the `[database]` settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from(&DatabaseSettings::default())
    }
}

impl From<&DatabaseSettings> for DatabaseConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            url: settings.url.clone(),
            max_connections: settings.max_connections,
            min_connections: settings.min_connections,
            acquire_timeout: Duration::from_secs(settings.acquire_timeout_seconds),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

/// Open the pool and make sure the server answers
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, OpenHouseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await?;

    let latency = health_check(&pool).await?;
    info!(
        max_connections = config.max_connections,
        latency_ms = latency.as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Apply the booking schema from `migrations/`
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), OpenHouseError> {
    let started = Instant::now();
    sqlx::migrate!("./migrations").run(pool).await?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "Booking schema up to date");
    Ok(())
}

/// Round-trip time of a trivial query
pub async fn health_check(pool: &DatabasePool) -> Result<Duration, OpenHouseError> {
    let started = Instant::now();
    sqlx::query("SELECT 1").execute(pool).await?;
    let latency = started.elapsed();
    if latency > Duration::from_secs(1) {
        warn!(latency_ms = latency.as_millis() as u64, "Slow database health check");
    }
    Ok(latency)
}
