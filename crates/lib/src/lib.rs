//!
//! Formwork: hierarchical reactive state for forms.
//! This library keeps a tree of named fields consistent while many independent
//! callers read and update it piecemeal.
//!
//! ## Core Concepts
//!
//! * **Paths (`path::FieldPath`)**: Dot-joined, normalized names such as `"address.street"`. The first segment is a top-level field id of the form.
//! * **Field states (`field::FieldState`)**: Every path holds either a leaf (`Field`) with a value, an initial value, touch flags and a validation result, or a structural `Map`/`List` node that only lists its children. A leaf turns into a `Map` or `List` once and never back.
//! * **Store (`store::FieldStore`)**: A shared, cloneable set of cells. All writes go through a `store::Transaction` that is applied under one lock, after which observers are notified. Nobody ever sees half a transaction.
//! * **Registration (`tree`)**: Turns batches of dotted names into parent/child edges and top-level ids, idempotently.
//! * **Lists (`list::ListHandle`)**: Structural add/remove/swap/move on list nodes. Row ids are recycled per list.
//! * **Aggregates (`aggregate::Snapshot`)**: Values, validity, dirtiness and touch state derived from one consistent read.
//! * **Forms (`form::Form`)**: The entry point. Registration, bulk mutation, reset, clear, and asynchronous submission through a `form::SubmitHandler`.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod field;
pub mod form;
pub mod list;
pub mod path;
pub mod store;
pub mod tree;
pub mod value;

pub use aggregate::Snapshot;
pub use config::FormConfig;
pub use field::{FieldState, LeafState, Validation, Validator};
pub use form::Form;
pub use path::FieldPath;
pub use store::FieldStore;
pub use value::Value;

/// Result type used throughout the Formwork library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Formwork library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Malformed field names
    #[error(transparent)]
    Path(path::PathError),

    /// Structured errors from the cell store
    #[error(transparent)]
    Store(store::StoreError),

    /// Validator failures
    #[error(transparent)]
    Field(field::FieldError),

    /// Structural misuse of the field tree
    #[error(transparent)]
    Tree(tree::TreeError),

    /// Form lifecycle and bulk mutation errors
    #[error(transparent)]
    Form(form::FormError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Path(_) => "path",
            Error::Store(_) => "store",
            Error::Field(_) => "field",
            Error::Tree(_) => "tree",
            Error::Form(_) => "form",
        }
    }

    /// Check if this error indicates something was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            Error::Form(form_err) => form_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error comes from applying an operation to the wrong
    /// kind or shape of node.
    pub fn is_structural_error(&self) -> bool {
        match self {
            Error::Tree(tree_err) => {
                tree_err.is_kind_error() || tree_err.is_shape_error() || tree_err.is_index_error()
            }
            _ => false,
        }
    }

    /// Check if this error is a list index out of range.
    pub fn is_index_error(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_index_error(),
            _ => false,
        }
    }

    /// Check if this error was raised by a validator.
    pub fn is_validator_error(&self) -> bool {
        match self {
            Error::Field(field_err) => field_err.is_validator_error(),
            _ => false,
        }
    }

    /// Check if this error comes from the submission path.
    pub fn is_submission_error(&self) -> bool {
        match self {
            Error::Form(form_err) => form_err.is_submission_error(),
            _ => false,
        }
    }

    /// Check if this error is type-related.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_type_error(),
            Error::Form(form_err) => form_err.is_type_error(),
            Error::Serialize(_) => true,
            _ => false,
        }
    }

    /// Check if this error is caused by a malformed field name.
    pub fn is_path_error(&self) -> bool {
        matches!(self, Error::Path(_))
    }
}
