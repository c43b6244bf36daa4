//! Connection pool setup and the background liveness probe.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::config::DatabaseConfig;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Opens the connection pool described by `config`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout())
        .acquire_timeout(config.connect_timeout())
        .max_lifetime(config.max_lifetime())
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(
        max_connections = config.max_connections,
        "Database pool ready"
    );
    Ok(db)
}

/// Shortest interval the liveness probe will run at.
pub const MIN_PING_INTERVAL: Duration = Duration::from_secs(1);

/// Pings the database every `every` until the task is aborted.
///
/// Intervals shorter than [`MIN_PING_INTERVAL`], zero included, are raised to
/// it. Failures are logged and never stop the probe.
pub fn spawn_liveness_probe(db: DatabaseConnection, every: Duration) -> JoinHandle<()> {
    let every = every.max(MIN_PING_INTERVAL);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            match db.ping().await {
                Ok(()) => debug!("Database ping ok"),
                Err(e) => warn!(error = %e, "Database ping failed"),
            }
        }
    })
}
