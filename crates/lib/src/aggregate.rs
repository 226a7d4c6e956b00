//! Derived aggregates over one consistent read of a form.
//!
//! A [`Snapshot`] is taken by [`FieldStore::snapshot`](crate::FieldStore::snapshot)
//! under a single read lock, so every aggregate computed from it sees the
//! same committed version of every cell. Nothing here is cached; each call
//! walks the tree again.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    config::ValidityMode,
    field::{FieldState, LeafState, Validation},
    form::{FormId, FormState, SubmissionState},
    path::FieldPath,
    tree::traversal,
    value::Value,
};

/// Validity of a whole form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormValidation {
    /// Logical AND of every leaf's `is_valid`.
    pub is_valid: bool,
    /// Logical AND of every leaf's `is_valid_strict`.
    pub is_valid_strict: bool,
    /// Per-leaf results keyed by qualified path.
    pub fields: BTreeMap<String, Validation>,
}

impl FormValidation {
    /// The flag selected by `mode`.
    pub fn is_valid_for(&self, mode: ValidityMode) -> bool {
        match mode {
            ValidityMode::Normal => self.is_valid,
            ValidityMode::Strict => self.is_valid_strict,
        }
    }

    /// Leaves that fail under `mode`.
    pub fn failing(&self, mode: ValidityMode) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, validation)| match mode {
                ValidityMode::Normal => !validation.is_valid,
                ValidityMode::Strict => !validation.is_valid_strict,
            })
            .map(|(path, _)| path.as_str())
            .collect()
    }
}

/// Dirtiness of a whole form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDirty {
    /// Per-leaf dirty flags keyed by qualified path.
    pub fields: BTreeMap<String, bool>,
    /// `true` if any leaf is dirty.
    pub is_dirty: bool,
}

#[derive(Clone, Copy)]
enum Source {
    Current,
    Initial,
}

impl Source {
    fn pick(self, leaf: &LeafState) -> &Value {
        match self {
            Source::Current => &leaf.value,
            Source::Initial => &leaf.initial_value,
        }
    }
}

/// The committed state of one form at one store version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    form: FormId,
    state: FormState,
    fields: HashMap<FieldPath, FieldState>,
    version: u64,
}

impl Snapshot {
    pub(crate) fn new(
        form: FormId,
        state: FormState,
        fields: HashMap<FieldPath, FieldState>,
        version: u64,
    ) -> Self {
        Self {
            form,
            state,
            fields,
            version,
        }
    }

    pub fn form_id(&self) -> &FormId {
        &self.form
    }

    /// Store version this snapshot was read at.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn form_state(&self) -> &FormState {
        &self.state
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.state.submission
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    /// Registered top-level field ids, in registration order.
    pub fn field_ids(&self) -> &[String] {
        &self.state.field_ids
    }

    /// The stored node at `path`, or `None` if the cell was never written.
    pub fn node(&self, path: &FieldPath) -> Option<&FieldState> {
        self.fields.get(path)
    }

    /// The leaf at `path`, or `None` if it is absent or structural.
    pub fn leaf(&self, path: &FieldPath) -> Option<&LeafState> {
        self.fields.get(path).and_then(FieldState::as_leaf)
    }

    /// Paths of every stored cell of this form, reachable or not.
    pub fn stored_paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.fields.keys()
    }

    fn roots(&self) -> Vec<FieldPath> {
        self.state
            .field_ids
            .iter()
            .filter_map(|id| FieldPath::parse(id).ok())
            .collect()
    }

    /// Every leaf reachable from the registered field ids, depth first in
    /// child order.
    pub fn all_field_ids(&self) -> Vec<FieldPath> {
        traversal::leaf_paths(self.roots(), |path| self.fields.get(path).cloned())
    }

    /// Leaves under `path` (or `path` itself when it is a leaf).
    pub fn leaves_under(&self, path: &FieldPath) -> Vec<FieldPath> {
        traversal::leaf_paths([path.clone()], |p| self.fields.get(p).cloned())
    }

    /// Nested current values. Structural nodes without any leaf below them
    /// are omitted.
    pub fn values(&self) -> Value {
        self.render_form(Source::Current, false)
    }

    /// Nested current values, including empty maps and lists.
    pub fn all_values(&self) -> Value {
        self.render_form(Source::Current, true)
    }

    /// Nested initial values. Structural nodes without any leaf below them
    /// are omitted.
    pub fn initial_values(&self) -> Value {
        self.render_form(Source::Initial, false)
    }

    fn render_form(&self, source: Source, keep_empty: bool) -> Value {
        let mut out = BTreeMap::new();
        for root in self.roots() {
            if let Some(value) = self.render(&root, source, keep_empty) {
                out.insert(root.as_str().to_string(), value);
            }
        }
        Value::Map(out)
    }

    fn render(&self, path: &FieldPath, source: Source, keep_empty: bool) -> Option<Value> {
        match self.fields.get(path) {
            None => Some(source.pick(&LeafState::default()).clone()),
            Some(FieldState::Field(leaf)) => Some(source.pick(leaf).clone()),
            Some(FieldState::Map { children }) => {
                let map: BTreeMap<String, Value> = children
                    .iter()
                    .filter(|child| child.starts_with(path))
                    .filter_map(|child| {
                        self.render(child, source, keep_empty)
                            .map(|value| (child.last().to_string(), value))
                    })
                    .collect();
                (keep_empty || !map.is_empty()).then_some(Value::Map(map))
            }
            Some(FieldState::List { children }) => {
                let items: Vec<Value> = children
                    .iter()
                    .filter(|child| child.starts_with(path))
                    .filter_map(|child| self.render(child, source, keep_empty))
                    .collect();
                (keep_empty || !items.is_empty()).then_some(Value::List(items))
            }
        }
    }

    /// Validity of every reachable leaf.
    pub fn validation(&self) -> FormValidation {
        let mut result = FormValidation {
            is_valid: true,
            is_valid_strict: true,
            fields: BTreeMap::new(),
        };
        for path in self.all_field_ids() {
            let validation = self
                .leaf(&path)
                .map(|leaf| leaf.validation.clone())
                .unwrap_or_default();
            result.is_valid &= validation.is_valid;
            result.is_valid_strict &= validation.is_valid_strict;
            result.fields.insert(path.to_string(), validation);
        }
        result
    }

    /// Dirtiness using `Value` equality.
    pub fn dirty(&self) -> FormDirty {
        self.dirty_by(&|a: &Value, b: &Value| a == b)
    }

    /// Dirtiness using a caller-supplied equality.
    pub fn dirty_by(&self, eq: &dyn Fn(&Value, &Value) -> bool) -> FormDirty {
        let default_leaf = LeafState::default();
        let fields: BTreeMap<String, bool> = self
            .all_field_ids()
            .into_iter()
            .map(|path| {
                let leaf = self.leaf(&path).unwrap_or(&default_leaf);
                (path.to_string(), leaf.is_dirty_by(eq))
            })
            .collect();
        let is_dirty = fields.values().any(|dirty| *dirty);
        FormDirty { fields, is_dirty }
    }

    /// Touched flag of every reachable leaf.
    pub fn touched(&self) -> BTreeMap<String, bool> {
        self.all_field_ids()
            .into_iter()
            .map(|path| {
                let touched = self.leaf(&path).is_some_and(|leaf| leaf.touched);
                (path.to_string(), touched)
            })
            .collect()
    }
}
