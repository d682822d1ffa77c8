//! Validated tenant table identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Postgres truncates identifiers longer than this.
pub const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableNameError {
    #[error("Table name cannot be empty")]
    Empty,

    #[error("Identifier '{0}' exceeds {MAX_IDENTIFIER_LEN} characters")]
    TooLong(String),

    #[error("Identifier '{0}' must start with a letter or underscore")]
    LeadingDigit(String),

    #[error("Identifier '{0}' may only contain ASCII letters, digits and underscores")]
    InvalidCharacter(String),

    #[error("Table name '{0}' has more than one schema qualifier")]
    TooManyParts(String),
}

/// A table name that is safe to splice into DDL and DML.
///
/// Accepts `table` or `schema.table`; each part is an unquoted Postgres
/// identifier. Rendering always double-quotes every part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    pub fn parse(raw: &str) -> Result<Self, TableNameError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TableNameError::Empty);
        }

        let mut parts = raw.split('.');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(TableNameError::TooManyParts(raw.to_string()));
        }

        match second {
            Some(table) => Ok(Self {
                schema: Some(validate_identifier(first)?),
                table: validate_identifier(table)?,
            }),
            None => Ok(Self {
                schema: None,
                table: validate_identifier(first)?,
            }),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Quoted form for SQL text, e.g. `"analytics"."nft_bids"`
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{}\".\"{}\"", schema, self.table),
            None => format!("\"{}\"", self.table),
        }
    }
}

fn validate_identifier(part: &str) -> Result<String, TableNameError> {
    if part.is_empty() {
        return Err(TableNameError::Empty);
    }
    if part.len() > MAX_IDENTIFIER_LEN {
        return Err(TableNameError::TooLong(part.to_string()));
    }
    if !part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(TableNameError::InvalidCharacter(part.to_string()));
    }
    if part.as_bytes()[0].is_ascii_digit() {
        return Err(TableNameError::LeadingDigit(part.to_string()));
    }
    Ok(part.to_string())
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => f.write_str(&self.table),
        }
    }
}

impl std::str::FromStr for TableName {
    type Err = TableNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = TableNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.to_string()
    }
}
