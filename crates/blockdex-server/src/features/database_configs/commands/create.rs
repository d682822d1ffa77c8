//! Register a tenant store
//!
//! Connectivity is checked right after saving; an unreachable store is still
//! saved, with `status = error` and the failure message.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::check_and_record;
use crate::features::shared::validation::{
    validate_name, validate_port, validate_required, NameValidationError, MAX_NAME_LENGTH,
};
use crate::models::{DatabaseConfig, DATABASE_CONFIG_COLUMNS};
use crate::sink::SinkConnector;

const DEFAULT_PORT: i32 = 5432;

fn default_port() -> i32 {
    DEFAULT_PORT
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CreateDatabaseConfigCommand {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(alias = "databaseName")]
    pub database_name: String,
    #[serde(default)]
    pub ssl: bool,
}

impl std::fmt::Debug for CreateDatabaseConfigCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateDatabaseConfigCommand")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("database_name", &self.database_name)
            .field("ssl", &self.ssl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateDatabaseConfigError {
    #[error("{0}")]
    InvalidName(#[from] NameValidationError),
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateDatabaseConfigCommand {
    pub fn validate(&self) -> Result<(), CreateDatabaseConfigError> {
        validate_name(&self.name, MAX_NAME_LENGTH)?;
        validate_required(&self.host, "Host")
            .and_then(|_| validate_required(&self.username, "Username"))
            .and_then(|_| validate_required(&self.database_name, "Database name"))
            .and_then(|_| validate_port(self.port))
            .map_err(CreateDatabaseConfigError::Validation)
    }
}

#[tracing::instrument(skip(pool, connector))]
pub async fn handle(
    pool: PgPool,
    connector: &dyn SinkConnector,
    command: CreateDatabaseConfigCommand,
) -> Result<DatabaseConfig, CreateDatabaseConfigError> {
    command.validate()?;

    let config = sqlx::query_as::<_, DatabaseConfig>(&format!(
        "INSERT INTO database_configs (id, name, host, port, username, password, database_name, ssl)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {DATABASE_CONFIG_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(command.name.trim())
    .bind(command.host.trim())
    .bind(command.port)
    .bind(&command.username)
    .bind(&command.password)
    .bind(command.database_name.trim())
    .bind(command.ssl)
    .fetch_one(&pool)
    .await?;

    let config = check_and_record(&pool, connector, &config).await?;

    tracing::info!(config_id = %config.id, status = config.status.as_str(), "Database config created");
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::ConnectionStatus;
    use crate::sink::testing::MemoryConnector;

    fn command() -> CreateDatabaseConfigCommand {
        CreateDatabaseConfigCommand {
            name: "Analytics warehouse".into(),
            host: "warehouse.internal".into(),
            port: 5432,
            username: "indexer".into(),
            password: "hunter2".into(),
            database_name: "chain".into(),
            ssl: true,
        }
    }

    #[test]
    fn test_validation() {
        assert!(command().validate().is_ok());

        let mut no_host = command();
        no_host.host = "".into();
        assert!(matches!(no_host.validate(), Err(CreateDatabaseConfigError::Validation(_))));

        let mut bad_port = command();
        bad_port.port = 0;
        assert!(matches!(bad_port.validate(), Err(CreateDatabaseConfigError::Validation(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", command()).contains("hunter2"));
    }

    #[test]
    fn test_port_defaults() {
        let cmd: CreateDatabaseConfigCommand = serde_json::from_value(serde_json::json!({
            "name": "w", "host": "h", "username": "u", "password": "p", "databaseName": "d"
        }))
        .unwrap();
        assert_eq!(cmd.port, 5432);
        assert!(!cmd.ssl);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_records_connectivity(pool: PgPool) -> sqlx::Result<()> {
        let connector = MemoryConnector::default();
        let config = handle(pool.clone(), &connector, command()).await.unwrap();
        assert_eq!(config.status, ConnectionStatus::Connected);
        assert!(config.last_checked_at.is_some());
        assert_eq!(connector.closed(), 1);

        let serialized = serde_json::to_value(&config).unwrap();
        assert!(serialized.get("password").is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_unreachable_store_is_still_saved(pool: PgPool) -> sqlx::Result<()> {
        let config = handle(pool.clone(), &MemoryConnector::unreachable(), command())
            .await
            .unwrap();
        assert_eq!(config.status, ConnectionStatus::Error);
        assert!(config.error.is_some());
        Ok(())
    }
}
