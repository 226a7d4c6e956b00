//! Field states: the contents of a single cell in the field tree.
//!
//! Every qualified path holds one [`FieldState`]:
//!
//! * [`FieldState::Field`]: a leaf with a value, an initial value, touch flags,
//!   a validator and the last validation result.
//! * [`FieldState::Map`]: a structural node with named children.
//! * [`FieldState::List`]: a structural node with ordered, generated children.
//!
//! A node starts life as a default `Field`. It can become a `Map` or a `List`
//! exactly once, through [`FieldState::into_map`] or [`FieldState::into_list`],
//! and never goes back. Structural nodes have no value of their own.

use std::{fmt, sync::Arc};

mod errors;
pub use errors::FieldError;

mod validation;
pub use validation::{
    AlwaysValid, FnValidator, NamedValidation, Required, Validation, Validator, ValidatorError,
    fallible_validator, validator,
};

use crate::{Result, path::FieldPath, tree::TreeError, value::Value};

/// The variant tag of a [`FieldState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Field,
    Map,
    List,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Field => write!(f, "field"),
            NodeKind::Map => write!(f, "map"),
            NodeKind::List => write!(f, "list"),
        }
    }
}

/// State of a leaf field.
#[derive(Clone)]
pub struct LeafState {
    pub value: Value,
    pub initial_value: Value,
    pub touched: bool,
    pub touched_after_submit: bool,
    pub validator: Arc<dyn Validator>,
    pub validation: Validation,
}

impl Default for LeafState {
    fn default() -> Self {
        Self {
            value: Value::Null,
            initial_value: Value::Null,
            touched: false,
            touched_after_submit: false,
            validator: Arc::new(AlwaysValid),
            validation: Validation::valid(),
        }
    }
}

impl fmt::Debug for LeafState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafState")
            .field("value", &self.value)
            .field("initial_value", &self.initial_value)
            .field("touched", &self.touched)
            .field("touched_after_submit", &self.touched_after_submit)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl LeafState {
    /// Runs the validator against the current value.
    ///
    /// This does not store the result; callers assign it to `validation`
    /// inside the transaction they are building.
    pub fn run_validator(&self, path: &FieldPath) -> Result<Validation> {
        self.validator.validate(&self.value).map_err(|err| {
            tracing::warn!(path = %path, error = %err, "Validator failed");
            FieldError::ValidatorFailed {
                path: path.to_string(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    /// Re-runs the validator and stores the result.
    pub fn revalidate(&mut self, path: &FieldPath) -> Result<()> {
        self.validation = self.run_validator(path)?;
        Ok(())
    }

    /// Restores `value` from `initial_value`, clears both touch flags and
    /// revalidates.
    pub fn reset(&mut self, path: &FieldPath) -> Result<()> {
        self.value = self.initial_value.clone();
        self.touched = false;
        self.touched_after_submit = false;
        self.revalidate(path)
    }

    /// `true` when `value` differs from `initial_value` under `eq`.
    pub fn is_dirty_by(&self, eq: &dyn Fn(&Value, &Value) -> bool) -> bool {
        !eq(&self.value, &self.initial_value)
    }
}

/// Contents of one cell of the field tree.
#[derive(Debug, Clone)]
pub enum FieldState {
    /// A leaf holding a value.
    Field(LeafState),
    /// Named children; an ordered set of qualified paths.
    Map { children: Vec<FieldPath> },
    /// Ordered children named `<list>.<generated-id>`.
    List { children: Vec<FieldPath> },
}

impl Default for FieldState {
    fn default() -> Self {
        FieldState::Field(LeafState::default())
    }
}

impl FieldState {
    /// Builds a leaf with the given initial value and validator, already
    /// validated against that value.
    pub fn leaf(
        path: &FieldPath,
        initial_value: Value,
        validator: Arc<dyn Validator>,
    ) -> Result<Self> {
        let mut leaf = LeafState {
            value: initial_value.clone(),
            initial_value,
            validator,
            ..LeafState::default()
        };
        leaf.revalidate(path)?;
        Ok(FieldState::Field(leaf))
    }

    /// Returns the variant tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            FieldState::Field(_) => NodeKind::Field,
            FieldState::Map { .. } => NodeKind::Map,
            FieldState::List { .. } => NodeKind::List,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, FieldState::Field(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, FieldState::Map { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldState::List { .. })
    }

    /// `true` for `Map` and `List`.
    pub fn is_structural(&self) -> bool {
        !self.is_field()
    }

    /// The leaf state, if this is a `Field`.
    pub fn as_leaf(&self) -> Option<&LeafState> {
        match self {
            FieldState::Field(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Mutable leaf state, if this is a `Field`.
    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafState> {
        match self {
            FieldState::Field(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Consumes the state and returns the leaf, or `NotAField`.
    pub fn into_leaf(self, path: &FieldPath) -> Result<LeafState> {
        match self {
            FieldState::Field(leaf) => Ok(leaf),
            other => Err(TreeError::NotAField {
                path: path.to_string(),
                kind: other.kind(),
            }
            .into()),
        }
    }

    /// Children of a structural node; empty for a leaf.
    pub fn children(&self) -> &[FieldPath] {
        match self {
            FieldState::Field(_) => &[],
            FieldState::Map { children } | FieldState::List { children } => children.as_slice(),
        }
    }

    /// First nesting wins: a `Field` becomes an empty `Map`; `Map` and `List`
    /// are returned unchanged.
    pub fn into_map(self) -> Self {
        match self {
            FieldState::Field(_) => FieldState::Map {
                children: Vec::new(),
            },
            structural => structural,
        }
    }

    /// A `Field` becomes an empty `List`; a `List` is returned unchanged.
    ///
    /// # Errors
    /// [`TreeError::NotAList`] if the node is already a `Map`.
    pub fn into_list(self, path: &FieldPath) -> Result<Self> {
        match self {
            FieldState::Field(_) => Ok(FieldState::List {
                children: Vec::new(),
            }),
            list @ FieldState::List { .. } => Ok(list),
            FieldState::Map { .. } => Err(TreeError::NotAList {
                path: path.to_string(),
                kind: NodeKind::Map,
            }
            .into()),
        }
    }

    /// Appends `child` unless already present. Returns whether it was added.
    ///
    /// Leaves have no children, so this is always `false` for a `Field`.
    pub fn add_child(&mut self, child: FieldPath) -> bool {
        match self {
            FieldState::Field(_) => false,
            FieldState::Map { children } | FieldState::List { children } => {
                if children.contains(&child) {
                    false
                } else {
                    children.push(child);
                    true
                }
            }
        }
    }

    /// Detaches `child`. Returns whether it was present.
    pub fn remove_child(&mut self, child: &FieldPath) -> bool {
        match self {
            FieldState::Field(_) => false,
            FieldState::Map { children } | FieldState::List { children } => {
                let before = children.len();
                children.retain(|existing| existing != child);
                children.len() != before
            }
        }
    }
}
