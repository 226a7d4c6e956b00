//! Forms: the public entry point.
//!
//! A [`Form`] is a cheap, cloneable handle bundling a form id, the
//! [`FieldStore`] holding its cells, its [`FormConfig`], the id pools of its
//! lists and an optional [`SubmitHandler`]. Several forms may share one store
//! without interfering, since every cell is keyed by form id.
//!
//! ```
//! use formwork::{Form, Value, form::FieldConfig, field::Required};
//! use std::sync::Arc;
//!
//! let form = Form::new("signup");
//! form.register_field("name", FieldConfig::new("").validator(Arc::new(Required::default())))?;
//! form.register_list("tags")?;
//!
//! assert!(!form.validation().is_valid);
//! form.field("name")?.set_value("x")?;
//! assert!(form.validation().is_valid);
//! assert_eq!(form.values().get("name"), Some(&Value::from("x")));
//! # Ok::<(), formwork::Error>(())
//! ```

use std::{fmt, sync::Arc};

use handle_trait::Handle;

mod bulk;
pub use bulk::SetOptions;

mod errors;
pub use errors::FormError;

mod handle;
pub use handle::FieldHandle;

mod mount;
pub use mount::MountGuard;

mod ready;
pub use ready::ReadyGate;

mod state;
pub use state::{FormId, FormState, SubmissionState, SubmitResult};

mod submit;
pub use submit::{Bag, SubmitError, SubmitEvent, SubmitHandler, SubmitOutcome};

use crate::{
    Result,
    aggregate::{FormDirty, FormValidation, Snapshot},
    config::FormConfig,
    field::{AlwaysValid, FieldState, Validator},
    list::{self, ListHandle, ListPools},
    path::FieldPath,
    store::{CellKey, FieldStore, Observer, SubscriptionId},
    tree::{self, TreeError},
    value::Value,
};

/// Initial settings of a leaf registered through [`Form::register_field`].
#[derive(Clone)]
pub struct FieldConfig {
    pub initial_value: Value,
    pub validator: Arc<dyn Validator>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            initial_value: Value::Null,
            validator: Arc::new(AlwaysValid),
        }
    }
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("initial_value", &self.initial_value)
            .finish_non_exhaustive()
    }
}

impl FieldConfig {
    pub fn new(initial_value: impl Into<Value>) -> Self {
        Self {
            initial_value: initial_value.into(),
            ..Self::default()
        }
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }
}

struct FormInner {
    id: FormId,
    store: FieldStore,
    config: FormConfig,
    pools: ListPools,
    handler: Option<Arc<dyn SubmitHandler>>,
}

impl fmt::Debug for FormInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

/// Handle to one form.
#[derive(Clone, Debug, Handle)]
pub struct Form {
    inner: Arc<FormInner>,
}

/// Builder for [`Form`].
///
/// ```
/// use formwork::{Form, FieldStore, config::{FormConfig, ValidityMode}};
///
/// let store = FieldStore::new();
/// let form = Form::builder("checkout")
///     .store(store.clone())
///     .config(FormConfig::default().with_validity(ValidityMode::Strict))
///     .build();
/// assert_eq!(form.id().as_str(), "checkout");
/// ```
#[derive(Default)]
pub struct FormBuilder {
    id: Option<FormId>,
    store: Option<FieldStore>,
    config: FormConfig,
    handler: Option<Arc<dyn SubmitHandler>>,
}

impl FormBuilder {
    pub fn new(id: impl Into<FormId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Shares an existing store instead of creating a private one.
    pub fn store(mut self, store: FieldStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Handler invoked by [`Form::submit`].
    pub fn handler(mut self, handler: impl SubmitHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Form {
        let id = self.id.unwrap_or_else(|| FormId::new(uuid::Uuid::new_v4().to_string()));
        tracing::debug!(form = %id, config = ?self.config, "Created form");
        Form {
            inner: Arc::new(FormInner {
                id,
                store: self.store.unwrap_or_default(),
                config: self.config,
                pools: ListPools::new(),
                handler: self.handler,
            }),
        }
    }
}

impl Form {
    /// A form with its own store and default configuration.
    pub fn new(id: impl Into<FormId>) -> Self {
        Self::builder(id).build()
    }

    pub fn builder(id: impl Into<FormId>) -> FormBuilder {
        FormBuilder::new(id)
    }

    pub fn id(&self) -> &FormId {
        &self.inner.id
    }

    pub fn store(&self) -> &FieldStore {
        &self.inner.store
    }

    pub fn config(&self) -> &FormConfig {
        &self.inner.config
    }

    pub(crate) fn pools(&self) -> &ListPools {
        &self.inner.pools
    }

    pub(crate) fn handler(&self) -> Option<&Arc<dyn SubmitHandler>> {
        self.inner.handler.as_ref()
    }

    /// Warns if `id` is not this form's identity. The form keeps its
    /// original id either way.
    pub fn check_identity(&self, id: impl Into<FormId>) -> bool {
        let id = id.into();
        if &id == self.id() {
            return true;
        }
        tracing::warn!(
            form = %self.id(),
            requested = %id,
            "Form identity cannot change after creation; keeping the original id"
        );
        false
    }

    /// Registers `names` in one transaction. Returns the newly added
    /// top-level ids.
    pub fn register<I, S>(&self, names: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store()
            .atomic(|tx| tree::register(tx, self.id(), names))
    }

    /// Unregisters `names` in one transaction.
    pub fn unregister<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store()
            .atomic(|tx| tree::unregister(tx, self.id(), names))
    }

    /// Registers a leaf and initializes it in the same transaction.
    ///
    /// # Errors
    /// [`TreeError::NotAField`] if `name` is already a map or list.
    pub fn register_field(&self, name: impl AsRef<str>, config: FieldConfig) -> Result<FieldHandle> {
        let path = FieldPath::parse(name)?;
        self.store().atomic(|tx| {
            tree::register(tx, self.id(), [path.as_str()])?;
            let current = tx.get_field(self.id(), &path);
            if current.is_structural() {
                return Err(TreeError::NotAField {
                    path: path.to_string(),
                    kind: current.kind(),
                }
                .into());
            }
            let leaf = FieldState::leaf(&path, config.initial_value, config.validator)?;
            tx.set_field(self.id(), &path, leaf);
            Ok(())
        })?;
        Ok(FieldHandle::new(self.handle(), path))
    }

    /// Registers `name` and makes it a list.
    ///
    /// # Errors
    /// [`TreeError::NotAList`] if `name` is already a map.
    pub fn register_list(&self, name: impl AsRef<str>) -> Result<ListHandle> {
        let path = FieldPath::parse(name)?;
        self.store().atomic(|tx| {
            tree::register(tx, self.id(), [path.as_str()])?;
            let children = list::list_children(tx, self.id(), &path)?;
            tx.set_field(self.id(), &path, FieldState::List { children });
            Ok(())
        })?;
        Ok(ListHandle::new(self.handle(), path))
    }

    /// Resets the cells at `names` back to default leaves.
    ///
    /// This does not unregister them.
    pub fn destroy<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = names
            .into_iter()
            .map(FieldPath::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store().atomic(|tx| {
            for path in &paths {
                tx.reset_field(self.id(), path);
            }
            Ok(())
        })?;
        tracing::debug!(form = %self.id(), count = paths.len(), "Destroyed fields");
        Ok(())
    }

    /// Registers `name` for as long as the returned guard lives.
    pub fn mount(&self, name: impl Into<String>) -> Result<MountGuard> {
        MountGuard::new(self.handle(), name.into())
    }

    /// Handle to the cell at `name`.
    pub fn field(&self, name: impl AsRef<str>) -> Result<FieldHandle> {
        Ok(FieldHandle::new(self.handle(), FieldPath::parse(name)?))
    }

    /// Handle to the list at `name`.
    pub fn list(&self, name: impl AsRef<str>) -> Result<ListHandle> {
        Ok(ListHandle::new(self.handle(), FieldPath::parse(name)?))
    }

    /// One consistent read of every cell of this form.
    pub fn snapshot(&self) -> Snapshot {
        self.store().snapshot(self.id())
    }

    pub fn values(&self) -> Value {
        self.snapshot().values()
    }

    pub fn all_values(&self) -> Value {
        self.snapshot().all_values()
    }

    pub fn initial_values(&self) -> Value {
        self.snapshot().initial_values()
    }

    pub fn field_ids(&self) -> Vec<String> {
        self.store().get_form(self.id()).field_ids
    }

    pub fn all_field_ids(&self) -> Vec<FieldPath> {
        self.snapshot().all_field_ids()
    }

    pub fn validation(&self) -> FormValidation {
        self.snapshot().validation()
    }

    pub fn dirty(&self) -> FormDirty {
        self.snapshot().dirty()
    }

    pub fn touched(&self) -> std::collections::BTreeMap<String, bool> {
        self.snapshot().touched()
    }

    pub fn submission(&self) -> SubmissionState {
        self.store().get_form(self.id()).submission
    }

    /// `true` while a submission is pending.
    pub fn is_submitting(&self) -> bool {
        self.store().get_form(self.id()).is_submitting()
    }

    /// Subscribes to changes of the cell at `name`.
    pub fn subscribe(
        &self,
        name: impl AsRef<str>,
        observer: impl Observer + 'static,
    ) -> Result<SubscriptionId> {
        let path = FieldPath::parse(name)?;
        Ok(self
            .store()
            .subscribe(CellKey::field(self.id(), &path), observer))
    }

    /// Subscribes to changes of the form-level node.
    pub fn subscribe_form(&self, observer: impl Observer + 'static) -> SubscriptionId {
        self.store().subscribe(CellKey::form(self.id()), observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.store().unsubscribe(id)
    }
}
