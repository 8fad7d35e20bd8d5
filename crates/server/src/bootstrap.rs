use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use waypoint_agent::ActionPipeline;
use waypoint_core::config::{AppConfig, ConfigError, LoadOptions};
use waypoint_core::store::InMemoryTripStore;
use waypoint_db::{connect, migrations, DbPool, SqlRecordSink};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub trip_store: Arc<InMemoryTripStore>,
    pub pipeline: Arc<ActionPipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "log sink database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    // The real trip store is an external collaborator; the in-memory
    // store backs local runs until one is wired in.
    let trip_store = Arc::new(InMemoryTripStore::new());
    let sink = Arc::new(SqlRecordSink::new(db_pool.clone()));
    let pipeline = Arc::new(ActionPipeline::new(trip_store.clone(), sink, &config.guard));

    Ok(Application { config, db_pool, trip_store, pipeline })
}

#[cfg(test)]
mod tests {
    use waypoint_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_applies_log_stream_migrations() {
        let app = bootstrap(memory_options()).await.expect("bootstrap succeeds");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('audit_record', 'telemetry_record')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query");
        assert_eq!(table_count, 2, "bootstrap should expose both log streams");
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_unreachable_database() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite:///nonexistent-dir/waypoint.db".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;
        assert!(result.is_err());
    }
}
