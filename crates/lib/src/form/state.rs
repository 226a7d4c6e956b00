//! Form-level state stored alongside the field cells.

use std::fmt;

use crate::value::Value;

/// Identifier of a form within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormId(String);

impl FormId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FormId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for FormId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How the last submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    /// The submit handler returned this value.
    Success(Value),
    /// The submit handler failed with this message.
    Failed(String),
}

/// Lifecycle of the form's submission.
///
/// `Idle → Pending → Settled`, and `Settled → Pending` on the next submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
    Settled(SubmitResult),
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Pending)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, SubmissionState::Settled(_))
    }
}

/// The form-level node: which top-level fields are registered, and the
/// submission lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    /// Top-level field names, in registration order, without duplicates.
    pub field_ids: Vec<String>,
    pub submission: SubmissionState,
}

impl FormState {
    /// Appends `id` if absent. Returns whether it was added.
    pub fn add_field_id(&mut self, id: &str) -> bool {
        if self.field_ids.iter().any(|existing| existing == id) {
            false
        } else {
            self.field_ids.push(id.to_string());
            true
        }
    }

    /// Removes `id`. Returns whether it was present.
    pub fn remove_field_id(&mut self, id: &str) -> bool {
        let before = self.field_ids.len();
        self.field_ids.retain(|existing| existing != id);
        self.field_ids.len() != before
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_pending()
    }
}
