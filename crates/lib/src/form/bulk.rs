//! Bulk mutations: values, errors, touch state, reset and clear.
//!
//! Each operation here commits exactly one transaction. Operations that
//! need to know the leaves of the form read them through that transaction,
//! so they see the state their own writes build on; other transactions may
//! still commit between two bulk calls (last writer wins).

use std::{fmt, sync::Arc};

use super::{Form, FormError};
use crate::{
    Result,
    field::{FieldState, LeafState, NamedValidation, Validation},
    form::FormId,
    list::ListPools,
    path::{FieldPath, validate_segment},
    store::Transaction,
    tree::{TreeError, traversal},
    value::{Value, ValueEq},
};

/// Options for [`Form::set_values`].
#[derive(Clone, Default)]
pub struct SetOptions {
    /// Revalidate written leaves. Unset means the form's `validate_on_set`.
    pub validate: Option<bool>,
    /// Equality deciding whether a leaf is already up to date. Unset means
    /// `Value` equality.
    pub equal: Option<ValueEq>,
}

impl fmt::Debug for SetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetOptions")
            .field("validate", &self.validate)
            .field("equal", &self.equal.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl SetOptions {
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn equal(mut self, equal: ValueEq) -> Self {
        self.equal = Some(equal);
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Target {
    Value,
    Initial,
}

/// Walks a nested `Value` against the field tree, staging leaf writes.
struct Assign<'a> {
    tx: &'a mut Transaction,
    form: &'a FormId,
    pools: &'a ListPools,
    target: Target,
    validate: bool,
    eq: &'a (dyn Fn(&Value, &Value) -> bool + Send + Sync),
    /// Child names handed out for new list rows.
    taken: Vec<FieldPath>,
    /// Child names of list rows dropped by the assignment.
    dropped: Vec<FieldPath>,
}

impl Assign<'_> {
    fn assign(&mut self, path: &FieldPath, value: &Value) -> Result<()> {
        match self.tx.get_field(self.form, path) {
            FieldState::Field(leaf) => self.assign_leaf(path, leaf, value),
            FieldState::Map { children } => self.assign_map(path, children, value),
            FieldState::List { children } => self.assign_list(path, children, value),
        }
    }

    fn assign_leaf(&mut self, path: &FieldPath, mut leaf: LeafState, value: &Value) -> Result<()> {
        match self.target {
            Target::Value => {
                if (self.eq)(&leaf.value, value) {
                    return Ok(());
                }
                leaf.value = value.clone();
                if self.validate {
                    leaf.revalidate(path)?;
                }
            }
            Target::Initial => {
                let pristine = (self.eq)(&leaf.value, &leaf.initial_value);
                leaf.initial_value = value.clone();
                if pristine {
                    leaf.value = value.clone();
                    leaf.revalidate(path)?;
                }
            }
        }
        tracing::trace!(form = %self.form, path = %path, "Assigned value");
        self.tx.set_field(self.form, path, FieldState::Field(leaf));
        Ok(())
    }

    fn assign_map(
        &mut self,
        path: &FieldPath,
        mut children: Vec<FieldPath>,
        value: &Value,
    ) -> Result<()> {
        let Value::Map(entries) = value else {
            return Err(TreeError::ShapeMismatch {
                path: path.to_string(),
                expected: "map",
                actual: value.type_name(),
            }
            .into());
        };

        let mut targets = Vec::with_capacity(entries.len());
        for key in entries.keys() {
            validate_segment(key)?;
            let child = path.join(key);
            if !children.contains(&child) {
                children.push(child.clone());
            }
            targets.push(child);
        }
        self.tx
            .set_field(self.form, path, FieldState::Map { children });

        for (child, item) in targets.iter().zip(entries.values()) {
            self.assign(child, item)?;
        }
        Ok(())
    }

    fn assign_list(
        &mut self,
        path: &FieldPath,
        mut children: Vec<FieldPath>,
        value: &Value,
    ) -> Result<()> {
        let Value::List(items) = value else {
            return Err(TreeError::ShapeMismatch {
                path: path.to_string(),
                expected: "list",
                actual: value.type_name(),
            }
            .into());
        };

        if items.len() < children.len() {
            self.dropped.extend(children.drain(items.len()..));
        }
        while children.len() < items.len() {
            let child = self.pools.generate_new_name(path);
            self.taken.push(child.clone());
            children.push(child);
        }
        tracing::debug!(form = %self.form, list = %path, len = items.len(), "Resized list");
        self.tx
            .set_field(self.form, path, FieldState::List { children: children.clone() });

        for (child, item) in children.iter().zip(items) {
            self.assign(child, item)?;
        }
        Ok(())
    }
}

impl Form {
    /// Writes a nested map of values into the tree in one transaction.
    ///
    /// Leaves equal to the new value (under `options.equal`) are skipped.
    /// Maps recurse by key; lists are resized to the incoming length, reusing
    /// pooled row ids for new rows and releasing the ids of dropped rows.
    ///
    /// # Errors
    /// * [`FormError::InvalidValues`] if `values` is not a map.
    /// * [`TreeError::ShapeMismatch`] if a map or list node is given a value
    ///   of another shape.
    /// * A failing validator; nothing is written in that case.
    pub fn set_values(&self, values: &Value, options: SetOptions) -> Result<()> {
        let validate = options.validate.unwrap_or(self.config().validate_on_set);
        let eq: ValueEq = options
            .equal
            .unwrap_or_else(|| Arc::new(|a: &Value, b: &Value| a == b));
        self.assign_values(values, Target::Value, validate, eq)?;
        tracing::debug!(form = %self.id(), validate, "Set values");
        Ok(())
    }

    /// Writes new initial values. Leaves whose value still equals their old
    /// initial value follow along and are revalidated.
    pub fn set_initial_values(&self, values: &Value) -> Result<()> {
        let eq: ValueEq = Arc::new(|a: &Value, b: &Value| a == b);
        self.assign_values(values, Target::Initial, true, eq)?;
        tracing::debug!(form = %self.id(), "Set initial values");
        Ok(())
    }

    fn assign_values(&self, values: &Value, target: Target, validate: bool, eq: ValueEq) -> Result<()> {
        let Value::Map(entries) = values else {
            return Err(FormError::InvalidValues {
                expected: "map",
                actual: values.type_name(),
            }
            .into());
        };

        let mut taken = Vec::new();
        let result = self.store().atomic(|tx| {
            let mut assign = Assign {
                tx,
                form: self.id(),
                pools: self.pools(),
                target,
                validate,
                eq: eq.as_ref(),
                taken: Vec::new(),
                dropped: Vec::new(),
            };
            let outcome = entries.iter().try_for_each(|(key, value)| {
                let path = FieldPath::parse(key)?;
                assign.assign(&path, value)
            });
            taken = std::mem::take(&mut assign.taken);
            outcome.map(|()| assign.dropped)
        });

        match result {
            Ok(dropped) => {
                self.pools().release_all(&dropped);
                Ok(())
            }
            Err(err) => {
                self.pools().release_all(&taken);
                Err(err)
            }
        }
    }

    /// Stores externally supplied validation results.
    ///
    /// A result addressed to a map or list is distributed to its children by
    /// the keys of its `children`.
    pub fn set_errors<I, N>(&self, errors: I) -> Result<()>
    where
        I: IntoIterator<Item = N>,
        N: Into<NamedValidation>,
    {
        let errors: Vec<NamedValidation> = errors.into_iter().map(Into::into).collect();
        self.store().atomic(|tx| {
            for named in &errors {
                let path = FieldPath::parse(&named.field)?;
                distribute_validation(tx, self.id(), &path, &named.validation)?;
            }
            Ok(())
        })?;
        tracing::debug!(form = %self.id(), count = errors.len(), "Set errors");
        Ok(())
    }

    /// Sets the touched flag of the named fields. A map or list name applies
    /// to every leaf below it.
    pub fn set_touched<I, S>(&self, touched: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let touched = touched
            .into_iter()
            .map(|(name, flag)| FieldPath::parse(name).map(|path| (path, flag)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store().atomic(|tx| {
            for (path, flag) in &touched {
                for leaf_path in traversal::leaves_under(tx, self.id(), path) {
                    tx.update_leaf(self.id(), &leaf_path, |leaf| {
                        leaf.touched = *flag;
                        Ok(())
                    })?;
                }
            }
            Ok(())
        })
    }

    /// Clears both touch flags of every leaf.
    pub fn reset_touched(&self) -> Result<()> {
        self.for_each_leaf(|leaf, _| {
            leaf.touched = false;
            leaf.touched_after_submit = false;
            Ok(())
        })
    }

    /// Marks every leaf touched.
    pub fn set_all_to_touched(&self) -> Result<()> {
        self.for_each_leaf(|leaf, _| {
            leaf.touched = true;
            Ok(())
        })
    }

    /// Marks every leaf touched and touched-after-submit.
    pub(crate) fn touch_all_after_submit(&self) -> Result<()> {
        self.for_each_leaf(|leaf, _| {
            leaf.touched = true;
            leaf.touched_after_submit = true;
            Ok(())
        })
    }

    /// Restores every leaf to its initial value, clears the touch flags and
    /// revalidates.
    pub fn reset(&self) -> Result<()> {
        self.for_each_leaf(|leaf, path| leaf.reset(path))?;
        tracing::debug!(form = %self.id(), "Reset form");
        Ok(())
    }

    /// Re-runs validators against current values. An empty `names` means
    /// every leaf; a map or list name means every leaf below it.
    pub fn revalidate<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = names
            .into_iter()
            .map(FieldPath::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if paths.is_empty() {
            return self.for_each_leaf(|leaf, path| leaf.revalidate(path));
        }
        self.store().atomic(|tx| {
            for path in &paths {
                for leaf_path in traversal::leaves_under(tx, self.id(), path) {
                    tx.update_leaf(self.id(), &leaf_path, |leaf| leaf.revalidate(&leaf_path))?;
                }
            }
            Ok(())
        })
    }

    /// Resets the form node and every stored cell of this form back to
    /// defaults, and drops the list id pools.
    pub fn clear(&self) -> Result<()> {
        self.store().atomic(|tx| {
            // Committed state cannot move while the transaction is open
            let snapshot = tx.store().snapshot(self.id());
            tx.reset_form(self.id());
            for path in snapshot.stored_paths() {
                tx.reset_field(self.id(), path);
            }
            Ok(())
        })?;
        self.pools().clear();
        tracing::debug!(form = %self.id(), "Cleared form");
        Ok(())
    }

    /// Applies `f` to every leaf in one transaction.
    fn for_each_leaf<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut LeafState, &FieldPath) -> Result<()>,
    {
        self.store().atomic(|tx| {
            for path in traversal::form_leaves(tx, self.id()) {
                tx.update_leaf(self.id(), &path, |leaf| f(leaf, &path))?;
            }
            Ok(())
        })
    }
}

fn distribute_validation(
    tx: &mut Transaction,
    form: &FormId,
    path: &FieldPath,
    validation: &Validation,
) -> Result<()> {
    if tx.get_field(form, path).is_structural() {
        for (key, child) in &validation.children {
            validate_segment(key)?;
            distribute_validation(tx, form, &path.join(key), child)?;
        }
        return Ok(());
    }
    tx.update_leaf(form, path, |leaf| {
        leaf.validation = validation.clone();
        Ok(())
    })
}
