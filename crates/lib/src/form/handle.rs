//! Per-field access.

use std::sync::Arc;

use super::Form;
use crate::{
    Result,
    field::{FieldState, LeafState, Validation, Validator},
    path::FieldPath,
    value::Value,
};

/// Reads and writes a single cell of a form.
///
/// Every write is its own transaction. Writes that need a leaf fail with
/// [`TreeError::NotAField`](crate::tree::TreeError::NotAField) on maps and
/// lists.
#[derive(Debug, Clone)]
pub struct FieldHandle {
    form: Form,
    path: FieldPath,
}

impl FieldHandle {
    pub(crate) fn new(form: Form, path: FieldPath) -> Self {
        Self { form, path }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Latest committed state; a default leaf if never written.
    pub fn state(&self) -> FieldState {
        self.form.store().get_field(self.form.id(), &self.path)
    }

    /// Current value of the leaf.
    pub fn value(&self) -> Result<Value> {
        Ok(self.state().into_leaf(&self.path)?.value)
    }

    /// Last stored validation of the leaf.
    pub fn validation(&self) -> Result<Validation> {
        Ok(self.state().into_leaf(&self.path)?.validation)
    }

    pub fn is_touched(&self) -> Result<bool> {
        Ok(self.state().into_leaf(&self.path)?.touched)
    }

    /// Writes the value, revalidating when the form's `validate_on_set` is
    /// enabled.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let validate = self.form.config().validate_on_set;
        self.update(|leaf, path| {
            leaf.value = value;
            if validate {
                leaf.revalidate(path)?;
            }
            Ok(())
        })
    }

    pub fn set_touched(&self, touched: bool) -> Result<()> {
        self.update(|leaf, _| {
            leaf.touched = touched;
            Ok(())
        })
    }

    /// Replaces the validator and revalidates the current value with it.
    pub fn set_validator(&self, validator: Arc<dyn Validator>) -> Result<()> {
        self.update(|leaf, path| {
            leaf.validator = validator;
            leaf.revalidate(path)
        })
    }

    /// Re-runs the validator, stores and returns the result.
    pub fn validate(&self) -> Result<Validation> {
        let mut result = Validation::valid();
        self.update(|leaf, path| {
            leaf.revalidate(path)?;
            result = leaf.validation.clone();
            Ok(())
        })?;
        Ok(result)
    }

    /// Restores the initial value and clears the touch flags.
    pub fn reset(&self) -> Result<()> {
        self.update(|leaf, path| leaf.reset(path))
    }

    /// Resets the cell back to a default leaf.
    pub fn destroy(&self) -> Result<()> {
        self.form.destroy([self.path.as_str()])
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut LeafState, &FieldPath) -> Result<()>,
    {
        let form = self.form.id();
        let path = &self.path;
        self.form
            .store()
            .atomic(|tx| tx.update_leaf(form, path, |leaf| f(leaf, path)))
    }
}
