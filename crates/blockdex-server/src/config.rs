//! Configuration management

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/blockdex";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ============================================================================
// Pipeline Configuration Constants
// ============================================================================

/// Default number of concurrent queue workers.
pub const DEFAULT_QUEUE_WORKERS: usize = 4;

/// Default time allowed to open a tenant store connection, in seconds.
pub const DEFAULT_SINK_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of rows per upsert statement.
pub const DEFAULT_SINK_BATCH_SIZE: usize = 500;

/// Largest accepted upsert batch. Postgres caps bind parameters at 65535 and
/// the widest table template binds 6 values per row.
pub const MAX_SINK_BATCH_SIZE: usize = 5000;

/// Default Helius REST API base URL.
pub const DEFAULT_HELIUS_API_URL: &str = "https://api.helius.xyz/v0";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub queue: QueueConfig,
    pub sink: SinkConfig,
    pub provider: ProviderConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// System store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Task queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub workers: usize,
}

/// Tenant store writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub connect_timeout_secs: u64,
    pub batch_size: usize,
}

/// Webhook provider configuration.
///
/// Without an API key the server runs in direct-delivery mode: no upstream
/// subscriptions are managed and new jobs start with an empty backfill.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing)]
    pub helius_api_key: Option<String>,
    pub helius_api_url: String,
    pub webhook_base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field(
                "helius_api_key",
                &self.helius_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("helius_api_url", &self.helius_api_url)
            .field("webhook_base_url", &self.webhook_base_url)
            .finish()
    }
}

impl ProviderConfig {
    pub fn direct_delivery(&self) -> bool {
        self.helius_api_key.is_none()
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("BLOCKDEX_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("BLOCKDEX_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "BLOCKDEX_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            queue: QueueConfig {
                workers: env_or("QUEUE_WORKERS", DEFAULT_QUEUE_WORKERS),
            },
            sink: SinkConfig {
                connect_timeout_secs: env_or(
                    "SINK_CONNECT_TIMEOUT",
                    DEFAULT_SINK_CONNECT_TIMEOUT_SECS,
                ),
                batch_size: env_or("SINK_BATCH_SIZE", DEFAULT_SINK_BATCH_SIZE),
            },
            provider: ProviderConfig {
                helius_api_key: env_non_empty("HELIUS_API_KEY"),
                helius_api_url: env_non_empty("HELIUS_API_URL")
                    .unwrap_or_else(|| DEFAULT_HELIUS_API_URL.to_string()),
                webhook_base_url: env_non_empty("HELIUS_WEBHOOK_BASE_URL"),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.queue.workers == 0 {
            anyhow::bail!("Queue workers must be greater than 0");
        }

        if self.sink.connect_timeout_secs == 0 {
            anyhow::bail!("Sink connect timeout must be greater than 0");
        }

        if !(1..=MAX_SINK_BATCH_SIZE).contains(&self.sink.batch_size) {
            anyhow::bail!(
                "Sink batch size must be between 1 and {} (got {})",
                MAX_SINK_BATCH_SIZE,
                self.sink.batch_size
            );
        }

        if !self.provider.direct_delivery() && self.provider.webhook_base_url.is_none() {
            anyhow::bail!("HELIUS_WEBHOOK_BASE_URL is required when HELIUS_API_KEY is set");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            queue: QueueConfig {
                workers: DEFAULT_QUEUE_WORKERS,
            },
            sink: SinkConfig {
                connect_timeout_secs: DEFAULT_SINK_CONNECT_TIMEOUT_SECS,
                batch_size: DEFAULT_SINK_BATCH_SIZE,
            },
            provider: ProviderConfig {
                helius_api_key: None,
                helius_api_url: DEFAULT_HELIUS_API_URL.to_string(),
                webhook_base_url: None,
            },
        }
    }
}
