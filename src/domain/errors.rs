use std::fmt;

use thiserror::Error;

/// One rejected input field together with the rule it broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every violation found while checking one request.
///
/// Checks never stop at the first problem, so a caller sees all invalid
/// fields in a single response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the offending fields, each listed once, in check order.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::with_capacity(self.violations.len());
        for violation in &self.violations {
            if !fields.contains(&violation.field) {
                fields.push(violation.field);
            }
        }
        fields
    }

    pub fn into_result(self) -> Result<(), ProductError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ProductError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self
            .violations
            .iter()
            .map(|violation| violation.message.as_str())
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join(", "))
    }
}

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("product with id {0} not found")]
    NotFound(i64),
    #[error("invalid data file: {0}")]
    Decode(String),
    #[error("file access error: {0}")]
    Io(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProductError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }

    pub fn invalid_id() -> Self {
        Self::validation("id", "id must be positive")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
