//! Error types for leaf field operations.

use thiserror::Error;

/// Errors raised while operating on a single leaf field.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FieldError {
    /// A validator returned an error instead of a result
    #[error("Validator for field '{path}' failed: {reason}")]
    ValidatorFailed { path: String, reason: String },
}

impl FieldError {
    /// Check if this error came from a validator
    pub fn is_validator_error(&self) -> bool {
        matches!(self, FieldError::ValidatorFailed { .. })
    }

    /// Get the field path this error refers to
    pub fn path(&self) -> &str {
        match self {
            FieldError::ValidatorFailed { path, .. } => path,
        }
    }
}

impl From<FieldError> for crate::Error {
    fn from(err: FieldError) -> Self {
        crate::Error::Field(err)
    }
}
