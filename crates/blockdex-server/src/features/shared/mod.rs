//! Helpers shared by the feature slices

pub mod pagination;
pub mod validation;

pub use pagination::{PaginationMetadata, PaginationParams};
pub use validation::{validate_name, validate_port, validate_required, NameValidationError};

#[cfg(test)]
pub mod test_helpers;
