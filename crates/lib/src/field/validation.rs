//! Validation results and validators.
//!
//! A [`Validation`] carries two flags: `is_valid` and `is_valid_strict`. A
//! *warning* is valid but not strictly valid, so forms configured with
//! [`ValidityMode::Strict`](crate::config::ValidityMode::Strict) refuse to
//! submit while warnings remain.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::value::Value;

/// Boxed error returned by a failing validator.
pub type ValidatorError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of validating a single value, optionally with named sub-results.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Validation {
    pub is_valid: bool,
    pub is_valid_strict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Named sub-results, keyed by child segment when merged into a tree.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Validation>,
}

impl Default for Validation {
    fn default() -> Self {
        Self::valid()
    }
}

impl Validation {
    /// A passing result.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            is_valid_strict: true,
            message: None,
            children: BTreeMap::new(),
        }
    }

    /// A failing result.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            is_valid_strict: false,
            message: Some(message.into()),
            children: BTreeMap::new(),
        }
    }

    /// Valid, but not strictly valid.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            is_valid_strict: false,
            message: Some(message.into()),
            children: BTreeMap::new(),
        }
    }

    /// Attaches a named sub-result. The parent's flags absorb the child's.
    pub fn with_child(mut self, name: impl Into<String>, child: Validation) -> Self {
        self.is_valid &= child.is_valid;
        self.is_valid_strict &= child.is_valid_strict;
        self.children.insert(name.into(), child);
        self
    }

    /// Combines two results with logical AND. The first message wins.
    pub fn and(mut self, other: &Validation) -> Self {
        self.is_valid &= other.is_valid;
        self.is_valid_strict &= other.is_valid_strict;
        if self.message.is_none() {
            self.message = other.message.clone();
        }
        self
    }

    /// Tags `validation` with the field it belongs to, for `set_errors`.
    pub fn named(field: impl Into<String>, validation: Validation) -> NamedValidation {
        NamedValidation {
            field: field.into(),
            validation,
        }
    }
}

/// A validation result addressed to a specific field.
///
/// When the field is a structural node, the result's `children` are merged
/// into the children of that node by segment name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValidation {
    pub field: String,
    pub validation: Validation,
}

impl<S: Into<String>> From<(S, Validation)> for NamedValidation {
    fn from((field, validation): (S, Validation)) -> Self {
        Validation::named(field, validation)
    }
}

/// Computes a [`Validation`] for a field value.
///
/// Returning `Err` aborts the transaction of whichever operation invoked the
/// validator; nothing that operation staged becomes visible.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value) -> Result<Validation, ValidatorError>;
}

/// Validator used by fields that were never given one.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl Validator for AlwaysValid {
    fn validate(&self, _value: &Value) -> Result<Validation, ValidatorError> {
        Ok(Validation::valid())
    }
}

/// Fails on null, blank text and empty collections.
#[derive(Debug, Clone)]
pub struct Required {
    message: String,
}

impl Required {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for Required {
    fn default() -> Self {
        Self::new("required")
    }
}

impl Validator for Required {
    fn validate(&self, value: &Value) -> Result<Validation, ValidatorError> {
        if value.is_blank() {
            Ok(Validation::invalid(self.message.clone()))
        } else {
            Ok(Validation::valid())
        }
    }
}

/// Adapter turning a closure into a [`Validator`].
pub struct FnValidator<F> {
    f: F,
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").finish_non_exhaustive()
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<Validation, ValidatorError> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<Validation, ValidatorError> {
        (self.f)(value)
    }
}

/// Wraps an infallible closure as a shared validator.
///
/// ```
/// # use formwork::{Validation, Value, field::{Validator, validator}};
/// let max_len = validator(|value: &Value| match value.as_text() {
///     Some(text) if text.len() > 8 => Validation::invalid("too long"),
///     _ => Validation::valid(),
/// });
/// assert!(!max_len.validate(&Value::from("much too long")).unwrap().is_valid);
/// ```
pub fn validator<F>(f: F) -> Arc<dyn Validator>
where
    F: Fn(&Value) -> Validation + Send + Sync + 'static,
{
    Arc::new(FnValidator {
        f: move |value: &Value| Ok::<_, ValidatorError>(f(value)),
    })
}

/// Wraps a closure that may fail as a shared validator.
pub fn fallible_validator<F>(f: F) -> Arc<dyn Validator>
where
    F: Fn(&Value) -> Result<Validation, ValidatorError> + Send + Sync + 'static,
{
    Arc::new(FnValidator { f })
}
