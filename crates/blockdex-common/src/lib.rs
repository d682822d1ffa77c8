//! Blockdex Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the Blockdex workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`BlockdexError`] and the [`Result`] alias
//! - **Logging**: centralized `tracing` subscriber setup ([`logging`])
//! - **Types**: job type, job status, and webhook event status enums shared
//!   between the API, the queue worker, and the sink writer
//!
//! # Example
//!
//! ```no_run
//! use blockdex_common::types::{JobStatus, JobType};
//!
//! fn describe(raw_type: &str) -> blockdex_common::Result<String> {
//!     let job_type: JobType = raw_type.parse()?;
//!     Ok(format!("{} starts in {}", job_type, JobStatus::Pending))
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BlockdexError, Result};
pub use types::{JobStatus, JobType, WebhookEventStatus};
