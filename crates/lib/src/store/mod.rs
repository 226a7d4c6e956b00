//! The field cell store.
//!
//! A [`FieldStore`] owns every reactive cell of one or more forms: one
//! [`Cell::Form`] per form and one [`Cell::Field`] per qualified path. It is a
//! cheap, cloneable handle; clones share the same cells.
//!
//! # Transactions
//!
//! All writes go through a [`Transaction`], which stages them locally and
//! applies them under a single write lock on [`Transaction::commit`]. Observers
//! are notified after the lock is released, once per changed key, in staging
//! order. An observer therefore never sees a partially applied transaction.
//!
//! Transactions on one store are serialized: a live transaction holds the
//! store's commit gate from creation until it commits or is dropped, so its
//! reads cannot go stale before its writes land. The holding thread may open
//! nested transactions; other threads wait. Do not keep a transaction open
//! across an `.await`.
//!
//! Changes are delivered in commit (version) order. If another thread is
//! already delivering when a commit lands, that thread delivers the new
//! changes too, after the ones it has in hand; the committing call may then
//! return before its observers have run.
//!
//! ```
//! use formwork::{FieldPath, FieldStore, Value, form::FormId, store::{CellKey, Change}};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! let store = FieldStore::new();
//! let form = FormId::new("signup");
//! let name = FieldPath::parse("name")?;
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = seen.clone();
//! store.subscribe(CellKey::field(&form, &name), move |_change: &Change| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! store.atomic(|tx| {
//!     tx.update_leaf(&form, &name, |leaf| {
//!         leaf.value = Value::from("x");
//!         Ok(())
//!     })
//! })?;
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! # Ok::<(), formwork::Error>(())
//! ```
//!
//! Reads outside a transaction return the latest committed state.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    thread,
};

use handle_trait::Handle;

mod errors;
pub use errors::StoreError;

mod gate;
use gate::CommitGate;

mod transaction;
pub use transaction::Transaction;

use crate::{
    Result,
    aggregate::Snapshot,
    field::FieldState,
    form::{FormId, FormState},
    path::FieldPath,
};

/// Address of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKey {
    /// The form-level node of a form.
    Form(FormId),
    /// A field (leaf or structural) of a form.
    Field { form: FormId, path: FieldPath },
}

impl CellKey {
    pub fn form(form: &FormId) -> Self {
        CellKey::Form(form.clone())
    }

    pub fn field(form: &FormId, path: &FieldPath) -> Self {
        CellKey::Field {
            form: form.clone(),
            path: path.clone(),
        }
    }

    /// The form this cell belongs to.
    pub fn form_id(&self) -> &FormId {
        match self {
            CellKey::Form(form) | CellKey::Field { form, .. } => form,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            CellKey::Form(_) => "form",
            CellKey::Field { .. } => "field",
        }
    }

    /// The default contents of this cell.
    fn default_cell(&self) -> Cell {
        match self {
            CellKey::Form(_) => Cell::Form(FormState::default()),
            CellKey::Field { .. } => Cell::Field(FieldState::default()),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKey::Form(form) => write!(f, "{form}"),
            CellKey::Field { form, path } => write!(f, "{form}/{path}"),
        }
    }
}

/// Contents of a cell.
#[derive(Debug, Clone)]
pub enum Cell {
    Form(FormState),
    Field(FieldState),
}

impl Cell {
    fn kind_name(&self) -> &'static str {
        match self {
            Cell::Form(_) => "form",
            Cell::Field(_) => "field",
        }
    }

    pub fn as_form(&self) -> Option<&FormState> {
        match self {
            Cell::Form(state) => Some(state),
            Cell::Field(_) => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldState> {
        match self {
            Cell::Field(state) => Some(state),
            Cell::Form(_) => None,
        }
    }
}

/// A committed change delivered to observers.
#[derive(Debug, Clone)]
pub struct Change {
    pub key: CellKey,
    /// The cell's contents as committed (the default if it was reset).
    pub cell: Cell,
    /// Store version produced by the commit.
    pub version: u64,
}

/// Receives committed changes for the keys it subscribed to.
///
/// Observers run after the commit's lock is released, so they may read the
/// store or even start transactions of their own.
pub trait Observer: Send + Sync {
    fn on_change(&self, change: &Change);
}

impl<F> Observer for F
where
    F: Fn(&Change) + Send + Sync,
{
    fn on_change(&self, change: &Change) {
        self(change)
    }
}

/// Handle returned by [`FieldStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct Cells {
    map: HashMap<CellKey, Cell>,
    version: u64,
}

#[derive(Default)]
struct Observers {
    by_key: HashMap<CellKey, Vec<(SubscriptionId, Arc<dyn Observer>)>>,
}

/// Committed changes waiting for delivery, in version order.
#[derive(Default)]
struct Pending {
    queue: VecDeque<Change>,
    delivering: bool,
}

#[derive(Default)]
struct StoreInner {
    cells: RwLock<Cells>,
    observers: RwLock<Observers>,
    gate: CommitGate,
    pending: Mutex<Pending>,
    next_subscription: AtomicU64,
}

/// Shared store of form and field cells.
#[derive(Clone, Default, Handle)]
pub struct FieldStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStore")
            .field("cells", &self.len())
            .field("version", &self.version())
            .finish()
    }
}

impl FieldStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a transaction against this store.
    pub fn transaction(&self) -> Transaction {
        Transaction::new(self.handle())
    }

    /// Runs `f` in a fresh transaction and commits it if `f` succeeds.
    ///
    /// If `f` returns an error nothing it staged becomes visible and no
    /// observer is notified.
    pub fn atomic<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction) -> Result<T>,
    {
        let mut tx = self.transaction();
        let out = f(&mut tx)?;
        tx.commit();
        Ok(out)
    }

    /// Latest committed contents of `key`, if the cell exists.
    pub fn get(&self, key: &CellKey) -> Option<Cell> {
        let cells = self
            .inner
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        cells.map.get(key).cloned()
    }

    /// Latest committed state of a field; default if never written.
    pub fn get_field(&self, form: &FormId, path: &FieldPath) -> FieldState {
        self.get(&CellKey::field(form, path))
            .and_then(|cell| match cell {
                Cell::Field(state) => Some(state),
                Cell::Form(_) => None,
            })
            .unwrap_or_default()
    }

    /// Latest committed state of a form node; default if never written.
    pub fn get_form(&self, form: &FormId) -> FormState {
        self.get(&CellKey::form(form))
            .and_then(|cell| match cell {
                Cell::Form(state) => Some(state),
                Cell::Field(_) => None,
            })
            .unwrap_or_default()
    }

    /// Monotonic counter bumped once per non-empty commit.
    pub fn version(&self) -> u64 {
        self.inner
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Number of materialized cells.
    pub fn len(&self) -> usize {
        self.inner
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads every cell of `form` under one lock.
    pub fn snapshot(&self, form: &FormId) -> Snapshot {
        let cells = self
            .inner
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let mut state = FormState::default();
        let mut fields = HashMap::new();
        for (key, cell) in cells.map.iter().filter(|(key, _)| key.form_id() == form) {
            match (key, cell) {
                (CellKey::Form(_), Cell::Form(form_state)) => state = form_state.clone(),
                (CellKey::Field { path, .. }, Cell::Field(field)) => {
                    fields.insert(path.clone(), field.clone());
                }
                _ => {}
            }
        }

        Snapshot::new(form.clone(), state, fields, cells.version)
    }

    /// Registers `observer` for changes to `key`.
    pub fn subscribe(&self, key: CellKey, observer: impl Observer + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        let mut observers = self
            .inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        tracing::trace!(key = %key, subscription = id.0, "Subscribed");
        observers
            .by_key
            .entry(key)
            .or_default()
            .push((id, Arc::new(observer)));
        id
    }

    /// Removes a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let mut observers = self
            .inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut found = false;
        observers.by_key.retain(|_, list| {
            let before = list.len();
            list.retain(|(existing, _)| *existing != id);
            found |= list.len() != before;
            !list.is_empty()
        });
        if found {
            Ok(())
        } else {
            Err(StoreError::SubscriptionNotFound { id: id.0 }.into())
        }
    }

    /// Applies staged writes atomically and queues their changes for
    /// delivery. Called with the commit gate held.
    ///
    /// `None` resets the cell back to its default by removing it.
    pub(crate) fn apply(&self, writes: Vec<(CellKey, Option<Cell>)>) -> u64 {
        let write_count = writes.len();
        let version = {
            let mut cells = self
                .inner
                .cells
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            cells.version += 1;
            let version = cells.version;

            let mut changes = Vec::with_capacity(writes.len());
            for (key, write) in writes {
                let cell = match write {
                    Some(cell) => {
                        cells.map.insert(key.clone(), cell.clone());
                        cell
                    }
                    None => {
                        cells.map.remove(&key);
                        key.default_cell()
                    }
                };
                changes.push(Change { key, cell, version });
            }

            // Queued before the cells lock is released so queue order is
            // version order.
            self.inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .queue
                .extend(changes);
            version
        };

        tracing::debug!(writes = write_count, version, "Committed transaction");
        version
    }

    /// Delivers queued changes until the queue is empty, unless another
    /// caller is already delivering. Called without the commit gate so
    /// observers may start transactions of their own.
    pub(crate) fn deliver_pending(&self) {
        {
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if pending.delivering {
                return;
            }
            pending.delivering = true;
        }
        let _reset = ResetOnPanic(&self.inner.pending);

        loop {
            let change = {
                let mut pending = self
                    .inner
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match pending.queue.pop_front() {
                    Some(change) => change,
                    None => {
                        pending.delivering = false;
                        return;
                    }
                }
            };
            self.notify(&change);
        }
    }

    fn notify(&self, change: &Change) {
        let targets: Vec<Arc<dyn Observer>> = {
            let observers = self
                .inner
                .observers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match observers.by_key.get(&change.key) {
                Some(list) => list.iter().map(|(_, observer)| observer.clone()).collect(),
                None => return,
            }
        };
        for observer in targets {
            observer.on_change(change);
        }
    }
}

/// Hands delivery back if an observer panics mid-delivery.
struct ResetOnPanic<'a>(&'a Mutex<Pending>);

impl Drop for ResetOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .delivering = false;
        }
    }
}
