//! Input checks shared by job and database config commands

use thiserror::Error;

pub const MAX_NAME_LENGTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Name is required and cannot be empty")]
    Required,

    #[error("Name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Non-blank and at most `max_length` characters
pub fn validate_name(name: &str, max_length: usize) -> Result<(), NameValidationError> {
    if name.trim().is_empty() {
        return Err(NameValidationError::Required);
    }
    if name.chars().count() > max_length {
        return Err(NameValidationError::TooLong { max_length });
    }
    Ok(())
}

/// A non-blank value for a required text field; the error names the field.
pub fn validate_required(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

/// TCP port in 1..=65535
pub fn validate_port(port: i32) -> Result<(), String> {
    if !(1..=65535).contains(&port) {
        return Err(format!("Port must be between 1 and 65535, got {port}"));
    }
    Ok(())
}
