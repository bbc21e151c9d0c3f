//! Field-level validation errors rendered as `[{field, error}]` details.

use std::fmt;

use catalog_http::AppError;
use serde_json::json;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Collects field errors until the caller decides to fail.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<(&'static str, String)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, error: impl Into<String>) {
        self.errors.push((field, error.into()));
    }

    /// Blank (or whitespace-only) values are missing.
    pub fn required(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
        }
    }

    /// Length is counted in characters, not bytes.
    pub fn max_chars(&mut self, field: &'static str, value: &str, max: usize) {
        let count = value.chars().count();
        if count > max {
            self.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {count})."),
            );
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_error(self, message: impl Into<String>) -> AppError {
        let details = self
            .errors
            .into_iter()
            .map(|(field, error)| json!({ "field": field, "error": error }))
            .collect();
        AppError::validation(details, message)
    }

    pub fn into_result(self, message: impl Into<String>) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into_error(message))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}
