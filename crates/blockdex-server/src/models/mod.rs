//! Database models

use blockdex_common::{BlockdexError, JobStatus, JobType, WebhookEventStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// Sentinel `webhook_id` for events delivered without an upstream subscription
pub const DIRECT_DELIVERY_WEBHOOK_ID: &str = "direct";

pub(crate) const INDEXING_JOB_COLUMNS: &str = "id, name, job_type, config, status, \
     database_config_id, webhook_id, records_indexed, last_sync_at, last_processing_time_ms, \
     error, created_at, updated_at";

pub(crate) const DATABASE_CONFIG_COLUMNS: &str = "id, name, host, port, username, password, \
     database_name, ssl, status, error, last_checked_at, created_at, updated_at";

pub(crate) const WEBHOOK_EVENT_COLUMNS: &str =
    "id, webhook_id, indexing_job_id, payload, status, error, created_at";

/// Job-type-specific parameters, stored as JSONB.
///
/// Keys are camelCase to stay compatible with configs written by existing
/// clients. Keys not modelled here are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplaces: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobConfig {
    pub fn allows_collection(&self, collection: Option<&str>) -> bool {
        allow_listed(&self.collections, collection)
    }

    pub fn allows_marketplace(&self, marketplace: Option<&str>) -> bool {
        allow_listed(&self.marketplaces, marketplace)
    }

    pub fn allows_token(&self, token: Option<&str>) -> bool {
        allow_listed(&self.tokens, token)
    }

    pub fn allows_platform(&self, platform: Option<&str>) -> bool {
        allow_listed(&self.platforms, platform)
    }

    /// Configured collections, empty when unfiltered
    pub fn collection_list(&self) -> &[String] {
        self.collections.as_deref().unwrap_or_default()
    }

    pub fn token_list(&self) -> &[String] {
        self.tokens.as_deref().unwrap_or_default()
    }
}

/// An unset or empty list allows everything; otherwise the value must be listed.
fn allow_listed(list: &Option<Vec<String>>, value: Option<&str>) -> bool {
    match list.as_deref() {
        None | Some([]) => true,
        Some(allowed) => value.is_some_and(|v| allowed.iter().any(|a| a == v)),
    }
}

/// Indexing job as stored in the system store
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IndexingJob {
    pub id: Uuid,
    pub name: String,
    /// Raw stored type; parsed with [`IndexingJob::kind`] where it matters
    #[serde(rename = "type")]
    pub job_type: String,
    pub config: Json<JobConfig>,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub database_config_id: Uuid,
    pub webhook_id: Option<String>,
    pub records_indexed: i64,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_processing_time_ms: Option<i64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IndexingJob {
    pub fn kind(&self) -> Result<JobType, BlockdexError> {
        self.job_type.parse()
    }
}

/// Connectivity of a tenant store as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Unknown,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "unknown",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl TryFrom<String> for ConnectionStatus {
    type Error = BlockdexError;

    fn try_from(value: String) -> Result<Self, BlockdexError> {
        match value.as_str() {
            "unknown" => Ok(ConnectionStatus::Unknown),
            "connected" => Ok(ConnectionStatus::Connected),
            "error" => Ok(ConnectionStatus::Error),
            _ => Err(BlockdexError::Config(format!(
                "Invalid connection status: {}",
                value
            ))),
        }
    }
}

/// Connection descriptor of a tenant store. The password never leaves the
/// server in responses.
#[derive(Clone, Serialize, FromRow)]
pub struct DatabaseConfig {
    pub id: Uuid,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database_name: String,
    pub ssl: bool,
    #[sqlx(try_from = "String")]
    pub status: ConnectionStatus,
    pub error: Option<String>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("database_name", &self.database_name)
            .field("ssl", &self.ssl)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Entry of the append-only webhook audit log
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub webhook_id: String,
    pub indexing_job_id: String,
    pub payload: Json<serde_json::Value>,
    #[sqlx(try_from = "String")]
    pub status: WebhookEventStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
