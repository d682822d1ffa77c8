//! Delete a tenant store descriptor that no job references

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatabaseConfigCommand {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatabaseConfigResponse {
    pub id: Uuid,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteDatabaseConfigError {
    #[error("Database config {0} not found")]
    NotFound(Uuid),
    #[error("Database config {0} is used by indexing jobs")]
    InUse(Uuid),
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for DeleteDatabaseConfigError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    command: DeleteDatabaseConfigCommand,
) -> Result<DeleteDatabaseConfigResponse, DeleteDatabaseConfigError> {
    let result = sqlx::query("DELETE FROM database_configs WHERE id = $1")
        .bind(command.id)
        .execute(&pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_foreign_key_violation() => DeleteDatabaseConfigError::InUse(command.id),
            _ => DeleteDatabaseConfigError::Database(e),
        })?;

    if result.rows_affected() == 0 {
        return Err(DeleteDatabaseConfigError::NotFound(command.id));
    }

    tracing::info!(config_id = %command.id, "Database config deleted");
    Ok(DeleteDatabaseConfigResponse {
        id: command.id,
        deleted: true,
    })
}
