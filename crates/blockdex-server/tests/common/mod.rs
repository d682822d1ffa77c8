//! Shared utilities for integration tests
//!
//! [`TestPostgres`] starts a throwaway PostgreSQL container. Tests use it as a
//! tenant store for the sink writer, so migrations are optional.
//!
//! ```no_run
//! mod common;
//! use common::TestPostgres;
//!
//! #[tokio::test]
//! async fn test_with_postgres() {
//!     let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
//!     sqlx::query("SELECT 1").execute(pg.pool()).await.expect("Query failed");
//! }
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{body::Body, http::Request, Router};
use blockdex_server::sink::SinkTarget;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tower::ServiceExt;
use tracing::{debug, info};

const POSTGRES_USER: &str = "postgres";
const POSTGRES_PASSWORD: &str = "postgres";
const POSTGRES_DB: &str = "postgres";

/// PostgreSQL test container wrapper
pub struct TestPostgres {
    container: ContainerAsync<Postgres>,
    pool: PgPool,
    host: String,
    port: u16,
}

/// Options for [`TestPostgres::start_with_options`]
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    /// PostgreSQL version/tag (default: "16-alpine")
    pub version: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Apply the system store migrations on startup (default: false)
    pub run_migrations: bool,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            version: "16-alpine".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            run_migrations: false,
        }
    }
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        Self::start_with_options(PostgresOptions::default()).await
    }

    pub async fn start_with_options(options: PostgresOptions) -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag(&options.version)
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?
            .to_string();
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string = format!(
            "postgresql://{}:{}@{}:{}/{}",
            POSTGRES_USER, POSTGRES_PASSWORD, host, port, POSTGRES_DB
        );
        debug!("PostgreSQL connection: {}", connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(Duration::from_secs(options.acquire_timeout_secs))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        if options.run_migrations {
            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
        }

        Ok(Self {
            container,
            pool,
            host,
            port,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The container described as a tenant store
    pub fn sink_target(&self) -> SinkTarget {
        SinkTarget {
            host: self.host.clone(),
            port: self.port,
            username: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            ssl: false,
        }
    }
}

/// A target nothing listens on
pub fn unreachable_target() -> SinkTarget {
    SinkTarget {
        host: "127.0.0.1".to_string(),
        port: 1,
        username: "indexer".to_string(),
        password: "secret".to_string(),
        database: "chain".to_string(),
        ssl: false,
    }
}

/// Send a request through the router and decode the JSON body
pub async fn send_json(app: &Router, request: Request<Body>) -> (axum::http::StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };
    (status, body)
}

/// Initialize test tracing once
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,blockdex_server=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}
