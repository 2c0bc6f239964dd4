use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::VelocityError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

/// Connect to Postgres, retrying with backoff.
/// A missing url is reported as `NotConfigured` before any connection attempt.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, VelocityError> {
    let url = match config.url.as_deref() {
        Some(u) if !u.trim().is_empty() => u,
        _ => return Err(VelocityError::NotConfigured("Database".to_string())),
    };

    let retry_strategy = ExponentialBackoff::from_millis(config.retry_delay_ms)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(config.connect_retries);

    let pool = Retry::spawn(retry_strategy, || {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
    })
    .await
    .map_err(|e| {
        tracing::error!(
            attempts = config.connect_retries + 1,
            error = %e,
            "All database connection attempts failed"
        );
        VelocityError::Database(e)
    })?;

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}
