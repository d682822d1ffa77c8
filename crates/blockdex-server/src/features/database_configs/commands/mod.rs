pub mod create;
pub mod delete;
pub mod test_connection;
pub mod update;

pub use create::{CreateDatabaseConfigCommand, CreateDatabaseConfigError};
pub use delete::{DeleteDatabaseConfigCommand, DeleteDatabaseConfigError, DeleteDatabaseConfigResponse};
pub use test_connection::{TestConnectionCommand, TestConnectionError};
pub use update::{UpdateDatabaseConfigCommand, UpdateDatabaseConfigError};

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ConnectionStatus, DatabaseConfig, DATABASE_CONFIG_COLUMNS};
use crate::sink::{SinkConnector, SinkError, SinkTarget};

/// `SELECT 1` over a transient session, closed whatever the outcome
pub(super) async fn probe(connector: &dyn SinkConnector, config: &DatabaseConfig) -> Result<(), SinkError> {
    let mut session = connector.open(&SinkTarget::from_config(config)?).await?;
    let result = session.ping().await;
    session.close().await;
    result
}

/// Probe the store and persist the observed status, error and check time
pub(super) async fn check_and_record(
    pool: &PgPool,
    connector: &dyn SinkConnector,
    config: &DatabaseConfig,
) -> Result<DatabaseConfig, sqlx::Error> {
    let (status, error) = match probe(connector, config).await {
        Ok(()) => (ConnectionStatus::Connected, None),
        Err(e) => {
            tracing::warn!(config_id = %config.id, error = %e, "Tenant store connectivity check failed");
            (ConnectionStatus::Error, Some(e.to_string()))
        },
    };

    sqlx::query_as::<_, DatabaseConfig>(&format!(
        "UPDATE database_configs
         SET status = $2, error = $3, last_checked_at = NOW(), updated_at = NOW()
         WHERE id = $1
         RETURNING {DATABASE_CONFIG_COLUMNS}"
    ))
    .bind(config.id)
    .bind(status.as_str())
    .bind(error)
    .fetch_one(pool)
    .await
}

pub(super) async fn fetch(pool: &PgPool, id: Uuid) -> Result<Option<DatabaseConfig>, sqlx::Error> {
    sqlx::query_as::<_, DatabaseConfig>(&format!(
        "SELECT {DATABASE_CONFIG_COLUMNS} FROM database_configs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
