//! Validation schema derived from a field specification.

pub mod compiler;
pub mod validation;
pub mod value;

#[cfg(test)]
mod tests;

pub use compiler::{compile, FieldRule, Rule, ValidationSchema};
pub use validation::{ErrorKind, ValidationError, ValidationErrors};
pub use value::StructuredValue;

use thiserror::Error;

use crate::path::FieldPath;

/// The specification itself violates its contract; no form can be built from it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("invalid specification at '{path}': {reason}")]
    InvalidSpecification { path: String, reason: String },
}

impl SchemaError {
    pub(crate) fn invalid(path: &FieldPath, reason: impl Into<String>) -> Self {
        SchemaError::InvalidSpecification {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
