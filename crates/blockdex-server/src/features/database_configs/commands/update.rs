//! Update a tenant store descriptor; connection changes are re-checked

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::check_and_record;
use crate::features::shared::validation::{
    validate_name, validate_port, validate_required, NameValidationError, MAX_NAME_LENGTH,
};
use crate::models::{DatabaseConfig, DATABASE_CONFIG_COLUMNS};
use crate::sink::SinkConnector;

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UpdateDatabaseConfigCommand {
    #[serde(skip)]
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<i32>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, alias = "databaseName")]
    pub database_name: Option<String>,
    #[serde(default)]
    pub ssl: Option<bool>,
}

impl std::fmt::Debug for UpdateDatabaseConfigCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDatabaseConfigCommand")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database_name", &self.database_name)
            .field("ssl", &self.ssl)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateDatabaseConfigError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error("{0}")]
    InvalidName(#[from] NameValidationError),
    #[error("{0}")]
    Validation(String),
    #[error("Database config {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UpdateDatabaseConfigCommand {
    fn touches_connection(&self) -> bool {
        self.host.is_some()
            || self.port.is_some()
            || self.username.is_some()
            || self.password.is_some()
            || self.database_name.is_some()
            || self.ssl.is_some()
    }

    pub fn validate(&self) -> Result<(), UpdateDatabaseConfigError> {
        if self.name.is_none() && !self.touches_connection() {
            return Err(UpdateDatabaseConfigError::NoFieldsToUpdate);
        }
        if let Some(ref name) = self.name {
            validate_name(name, MAX_NAME_LENGTH)?;
        }
        let checks = [
            self.host.as_deref().map(|h| validate_required(h, "Host")),
            self.username.as_deref().map(|u| validate_required(u, "Username")),
            self.database_name
                .as_deref()
                .map(|d| validate_required(d, "Database name")),
            self.port.map(validate_port),
        ];
        for check in checks.into_iter().flatten() {
            check.map_err(UpdateDatabaseConfigError::Validation)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, connector))]
pub async fn handle(
    pool: PgPool,
    connector: &dyn SinkConnector,
    command: UpdateDatabaseConfigCommand,
) -> Result<DatabaseConfig, UpdateDatabaseConfigError> {
    command.validate()?;

    let config = sqlx::query_as::<_, DatabaseConfig>(&format!(
        "UPDATE database_configs
         SET name = COALESCE($2, name),
             host = COALESCE($3, host),
             port = COALESCE($4, port),
             username = COALESCE($5, username),
             password = COALESCE($6, password),
             database_name = COALESCE($7, database_name),
             ssl = COALESCE($8, ssl),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {DATABASE_CONFIG_COLUMNS}"
    ))
    .bind(command.id)
    .bind(command.name.as_deref().map(str::trim))
    .bind(command.host.as_deref().map(str::trim))
    .bind(command.port)
    .bind(&command.username)
    .bind(&command.password)
    .bind(command.database_name.as_deref().map(str::trim))
    .bind(command.ssl)
    .fetch_optional(&pool)
    .await?
    .ok_or(UpdateDatabaseConfigError::NotFound(command.id))?;

    let config = if command.touches_connection() {
        check_and_record(&pool, connector, &config).await?
    } else {
        config
    };

    tracing::info!(config_id = %config.id, "Database config updated");
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::insert_database_config;
    use crate::models::ConnectionStatus;
    use crate::sink::testing::MemoryConnector;

    #[test]
    fn test_validation() {
        let empty = UpdateDatabaseConfigCommand::default();
        assert!(matches!(empty.validate(), Err(UpdateDatabaseConfigError::NoFieldsToUpdate)));

        let bad_port = UpdateDatabaseConfigCommand {
            port: Some(-1),
            ..Default::default()
        };
        assert!(matches!(bad_port.validate(), Err(UpdateDatabaseConfigError::Validation(_))));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_rename_skips_connectivity_check(pool: PgPool) -> sqlx::Result<()> {
        let id = insert_database_config(&pool, "warehouse").await?;
        let connector = MemoryConnector::default();

        let updated = handle(
            pool.clone(),
            &connector,
            UpdateDatabaseConfigCommand {
                id,
                name: Some("renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.status, ConnectionStatus::Unknown);
        assert_eq!(connector.opened(), 0);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_connection_change_is_rechecked(pool: PgPool) -> sqlx::Result<()> {
        let id = insert_database_config(&pool, "warehouse").await?;
        let connector = MemoryConnector::default();

        let updated = handle(
            pool.clone(),
            &connector,
            UpdateDatabaseConfigCommand {
                id,
                host: Some("replica.internal".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.host, "replica.internal");
        assert_eq!(updated.status, ConnectionStatus::Connected);
        assert_eq!(connector.opened(), 1);
        Ok(())
    }
}
