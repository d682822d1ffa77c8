//! Tenant store writer
//!
//! Everything needed to land indexed rows in a user's own Postgres:
//!
//! - [`table`]: validated table identifiers
//! - [`schema`]: the closed set of per-job-type table templates
//! - [`records`] and [`transform`]: typed rows and the payload transforms
//! - [`writer`]: transient sessions, DDL, and batched idempotent upserts
//!
//! Sessions are never shared between tasks or cached; each pipeline task
//! opens its own and closes it when done.

pub mod records;
pub mod schema;
pub mod table;
pub mod transform;
pub mod writer;

pub use records::SinkRecord;
pub use schema::SinkSchema;
pub use table::{TableName, TableNameError};
pub use writer::{
    write_records, PgSinkConnector, SinkConnector, SinkError, SinkSession, SinkTarget,
};

#[cfg(test)]
pub mod testing;
