//! Blockdex Server Library
#![recursion_limit = "256"]
//!
//! Indexes on-chain activity into Postgres databases owned by the user.
//!
//! # Overview
//!
//! - **Job Registry** ([`features::indexing_jobs`]): indexing jobs, their
//!   lifecycle (`pending`, `active`, `paused`, `error`) and statistics
//! - **Webhook Ingestion Gateway** ([`features::webhooks`]): audits every
//!   delivery and enqueues events for active jobs
//! - **Task Queue** ([`queue`]): durable apalis queue backed by the system
//!   store, drained by a pool of workers running the [`pipeline`]
//! - **Sink Writer** ([`sink`]): creates tables and upserts batches into the
//!   tenant store described by a database config
//! - **Provider** ([`provider`]): upstream webhook subscriptions and backfill
//!
//! # Architecture
//!
//! Feature slices follow a CQRS layout: `commands/` mutate state, `queries/`
//! read it, and `routes.rs` maps HTTP requests onto both. Handlers are plain
//! async functions over a [`sqlx::PgPool`] so the queue workers reuse them
//! through [`features::indexing_jobs::JobRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use blockdex_server::config::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     println!("binding {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod queue;
pub mod sink;

// Re-export commonly used types
pub use error::AppError;
