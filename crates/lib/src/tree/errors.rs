//! Error types for structural operations on the field tree.

use thiserror::Error;

use crate::field::NodeKind;

/// Errors raised when an operation does not fit the shape of the tree.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TreeError {
    /// A leaf operation targeted a structural node
    #[error("Field '{path}' is a {kind}, not a leaf field")]
    NotAField { path: String, kind: NodeKind },

    /// A list operation targeted a node that cannot become a list
    #[error("Field '{path}' is a {kind}, not a list")]
    NotAList { path: String, kind: NodeKind },

    /// A value's shape does not match the node it is assigned to
    #[error("Cannot assign {actual} to '{path}': expected {expected}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A list index is out of range
    #[error("Index {index} out of bounds for list '{path}' of length {len}")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

impl TreeError {
    /// Check if this error comes from applying an operation to the wrong node kind
    pub fn is_kind_error(&self) -> bool {
        matches!(
            self,
            TreeError::NotAField { .. } | TreeError::NotAList { .. }
        )
    }

    /// Check if this error is related to value shapes
    pub fn is_shape_error(&self) -> bool {
        matches!(self, TreeError::ShapeMismatch { .. })
    }

    /// Check if this error is a list index problem
    pub fn is_index_error(&self) -> bool {
        matches!(self, TreeError::IndexOutOfBounds { .. })
    }

    /// Get the path this error refers to
    pub fn path(&self) -> &str {
        match self {
            TreeError::NotAField { path, .. }
            | TreeError::NotAList { path, .. }
            | TreeError::ShapeMismatch { path, .. }
            | TreeError::IndexOutOfBounds { path, .. } => path,
        }
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}
