//! Indexing pipeline: turns queued tasks into tenant store writes
//!
//! [`IndexingProcessor`] handles both task kinds. Failures are classified by
//! [`PipelineError::disposition`] and absorbed into the job's status and
//! error, never returned to the queue.

pub mod error;
pub mod processor;

pub use error::{Disposition, PipelineError};
pub use processor::IndexingProcessor;
