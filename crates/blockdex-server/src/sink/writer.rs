//! Transient connections to tenant stores and batched upserts

use async_trait::async_trait;
use blockdex_common::JobType;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool, Postgres, QueryBuilder,
};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::records::{dedupe_by_natural_key, SinkRecord};
use super::schema::SinkSchema;
use super::table::TableName;
use crate::models::DatabaseConfig;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to upsert into {table}: {source}")]
    Upsert {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid port {0} for tenant store")]
    InvalidPort(i32),

    #[error("Connectivity check failed: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("Cannot write {found} records into a {expected} table")]
    RecordMismatch { expected: JobType, found: JobType },
}

/// Where and how to reach a tenant store
#[derive(Clone, PartialEq, Eq)]
pub struct SinkTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub ssl: bool,
}

impl SinkTarget {
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, SinkError> {
        let port = u16::try_from(config.port)
            .ok()
            .filter(|port| *port > 0)
            .ok_or(SinkError::InvalidPort(config.port))?;

        Ok(Self {
            host: config.host.clone(),
            port,
            username: config.username.clone(),
            password: config.password.clone(),
            database: config.database_name.clone(),
            ssl: config.ssl,
        })
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(if self.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Disable
            })
    }
}

impl fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl", &self.ssl)
            .finish()
    }
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

/// Opens sessions against tenant stores
#[async_trait]
pub trait SinkConnector: Send + Sync {
    async fn open(&self, target: &SinkTarget) -> Result<Box<dyn SinkSession>, SinkError>;
}

/// A single task's private connection to a tenant store
#[async_trait]
pub trait SinkSession: Send {
    /// Round-trip a trivial query
    async fn ping(&mut self) -> Result<(), SinkError>;

    /// `CREATE TABLE IF NOT EXISTS` from the schema template
    async fn ensure_table(
        &mut self,
        schema: &'static SinkSchema,
        table: &TableName,
    ) -> Result<(), SinkError>;

    /// Upsert all records in one transaction; returns rows written
    async fn upsert(
        &mut self,
        schema: &'static SinkSchema,
        table: &TableName,
        records: Vec<SinkRecord>,
    ) -> Result<u64, SinkError>;

    async fn close(self: Box<Self>);
}

/// Postgres connector building a one-connection pool per session
#[derive(Debug, Clone)]
pub struct PgSinkConnector {
    connect_timeout: Duration,
    batch_size: usize,
}

impl PgSinkConnector {
    pub fn new(connect_timeout: Duration, batch_size: usize) -> Self {
        Self {
            connect_timeout,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl SinkConnector for PgSinkConnector {
    async fn open(&self, target: &SinkTarget) -> Result<Box<dyn SinkSession>, SinkError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(self.connect_timeout)
            .connect_with(target.connect_options())
            .await
            .map_err(|source| SinkError::Connect {
                target: target.to_string(),
                source,
            })?;

        debug!(target_store = %target, "Opened tenant store session");

        Ok(Box::new(PgSinkSession {
            pool,
            batch_size: self.batch_size,
            target: target.to_string(),
        }))
    }
}

struct PgSinkSession {
    pool: PgPool,
    batch_size: usize,
    target: String,
}

#[async_trait]
impl SinkSession for PgSinkSession {
    async fn ping(&mut self) -> Result<(), SinkError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(SinkError::Ping)
    }

    async fn ensure_table(
        &mut self,
        schema: &'static SinkSchema,
        table: &TableName,
    ) -> Result<(), SinkError> {
        let ddl_err = |source| SinkError::CreateTable {
            table: table.to_string(),
            source,
        };

        // Concurrent `CREATE TABLE IF NOT EXISTS` on a new name collides in
        // pg_type, so sessions creating the same table take turns.
        let mut tx = self.pool.begin().await.map_err(ddl_err)?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(table.quoted())
            .execute(&mut *tx)
            .await
            .map_err(ddl_err)?;
        sqlx::query(&schema.create_table_sql(table))
            .execute(&mut *tx)
            .await
            .map_err(ddl_err)?;
        tx.commit().await.map_err(ddl_err)?;
        Ok(())
    }

    async fn upsert(
        &mut self,
        schema: &'static SinkSchema,
        table: &TableName,
        records: Vec<SinkRecord>,
    ) -> Result<u64, SinkError> {
        if let Some(other) = records.iter().find(|r| r.job_type() != schema.job_type) {
            return Err(SinkError::RecordMismatch {
                expected: schema.job_type,
                found: other.job_type(),
            });
        }

        let records = dedupe_by_natural_key(records);
        if records.is_empty() {
            return Ok(0);
        }

        let upsert_err = |source| SinkError::Upsert {
            table: table.to_string(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(upsert_err)?;
        let mut written = 0u64;

        for chunk in records.chunks(self.batch_size) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new(schema.insert_prefix(table));
            query_builder.push_values(chunk, |mut b, record| record.push_binds(&mut b));
            query_builder.push(schema.on_conflict_clause());

            let result = query_builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(upsert_err)?;
            written += result.rows_affected();
        }

        tx.commit().await.map_err(upsert_err)?;

        info!(
            target_store = %self.target,
            table = %table,
            records = written,
            "Upserted batch into tenant table"
        );

        Ok(written)
    }

    async fn close(self: Box<Self>) {
        self.pool.close().await;
        debug!(target_store = %self.target, "Closed tenant store session");
    }
}

/// Open a session, create the table if needed, upsert, and always close.
pub async fn write_records(
    connector: &dyn SinkConnector,
    target: &SinkTarget,
    schema: &'static SinkSchema,
    table: &TableName,
    records: Vec<SinkRecord>,
) -> Result<u64, SinkError> {
    let mut session = connector.open(target).await?;

    let result = async {
        session.ensure_table(schema, table).await?;
        session.upsert(schema, table, records).await
    }
    .await;

    session.close().await;
    result
}
