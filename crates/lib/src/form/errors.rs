//! Error types for form-level operations.

use thiserror::Error;

/// Errors raised by the form lifecycle and its bulk mutation surface.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FormError {
    /// The submit handler returned an error
    #[error("Submission of form '{form}' failed: {reason}")]
    SubmitFailed { form: String, reason: String },

    /// `submit` was called on a form built without a handler
    #[error("Form '{form}' has no submit handler")]
    NoSubmitHandler { form: String },

    /// A bulk write was given something other than a map of field values
    #[error("Expected {expected} of field values, got {actual}")]
    InvalidValues {
        expected: &'static str,
        actual: &'static str,
    },
}

impl FormError {
    /// Check if this error comes from the submission path
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            FormError::SubmitFailed { .. } | FormError::NoSubmitHandler { .. }
        )
    }

    /// Check if this error is caused by an argument of the wrong type
    pub fn is_type_error(&self) -> bool {
        matches!(self, FormError::InvalidValues { .. })
    }

    /// Check if this error indicates something missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, FormError::NoSubmitHandler { .. })
    }
}

impl From<FormError> for crate::Error {
    fn from(err: FormError) -> Self {
        crate::Error::Form(err)
    }
}
