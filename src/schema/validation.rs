//! Field-level validation errors.
//!
//! Every failing field contributes exactly one error, keyed by its path, so the
//! renderer can annotate all invalid controls after a single pass.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

use crate::path::FieldPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    RequiredField,
    TooLong,
    BelowMinimum,
    AboveMaximum,
    InvalidDate,
    InvalidOption,
    InvalidUrl,
    /// Value of the wrong shape for the field (e.g. a word for a number).
    TypeMismatch,
    /// Entry added to an array field whose item shape is unknown.
    UnexpectedItem,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Validation error with a user-facing message.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ErrorKind,
    pub message: String,
    /// Suggestion for how to fix the error
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(path: FieldPath, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn required(path: FieldPath) -> Self {
        Self::new(path, ErrorKind::RequiredField, "This field is required")
    }

    pub fn too_long(path: FieldPath, max_length: usize) -> Self {
        Self::new(
            path,
            ErrorKind::TooLong,
            format!("Must contain at most {} character(s)", max_length),
        )
    }

    pub fn below_minimum(path: FieldPath, min: f64) -> Self {
        Self::new(
            path,
            ErrorKind::BelowMinimum,
            format!("Must be greater than or equal to {}", min),
        )
    }

    pub fn above_maximum(path: FieldPath, max: f64) -> Self {
        Self::new(
            path,
            ErrorKind::AboveMaximum,
            format!("Must be less than or equal to {}", max),
        )
    }

    pub fn invalid_date(path: FieldPath) -> Self {
        Self::new(path, ErrorKind::InvalidDate, "Invalid date format (YYYY-MM-DD)")
            .with_suggestion("Use a date such as 2024-03-05")
    }

    pub fn invalid_option(path: FieldPath, options: &[String]) -> Self {
        Self::new(path, ErrorKind::InvalidOption, "Invalid option")
            .with_suggestion(format!("Expected one of: {}", options.join(", ")))
    }

    pub fn invalid_url(path: FieldPath) -> Self {
        Self::new(path, ErrorKind::InvalidUrl, "Must be a valid URL")
            .with_suggestion("Use an absolute address such as https://example.com/image.png")
    }

    pub fn type_mismatch(path: FieldPath, expected: &str) -> Self {
        Self::new(
            path,
            ErrorKind::TypeMismatch,
            format!("Expected {}", expected),
        )
    }

    pub fn unexpected_item(path: FieldPath) -> Self {
        Self::new(
            path,
            ErrorKind::UnexpectedItem,
            "This list does not accept entries",
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: ErrorKind,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a str>,
}

/// Collection of validation errors, at most one per field path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Adds an error unless the same path already failed.
    pub fn add(&mut self, error: ValidationError) {
        if self.get(&error.path).is_none() {
            self.errors.push(error);
        }
    }

    pub fn remove(&mut self, path: &FieldPath) {
        self.errors.retain(|error| &error.path != path);
    }

    /// Drops the error at `prefix` and every error nested below it.
    pub fn remove_under(&mut self, prefix: &FieldPath) {
        self.errors.retain(|error| !error.path.starts_with(prefix));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn get(&self, path: &FieldPath) -> Option<&ValidationError> {
        self.errors.iter().find(|error| &error.path == path)
    }

    pub fn kind_at(&self, path: &str) -> Option<ErrorKind> {
        let path: FieldPath = path.parse().ok()?;
        self.get(&path).map(|error| error.kind)
    }

    /// Single human-readable summary of every failure.
    pub fn to_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!(
            "Validation failed: {} error(s) found",
            self.errors.len()
        )];
        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }
        parts.join("\n")
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_message())
    }
}

impl std::error::Error for ValidationErrors {}

/// Serialized as `{ "<path>": { "kind", "message", "suggestion"? } }`.
impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for error in &self.errors {
            map.serialize_entry(
                &error.path.to_string(),
                &ErrorBody {
                    kind: error.kind,
                    message: &error.message,
                    suggestion: error.suggestion.as_deref(),
                },
            )?;
        }
        map.end()
    }
}
