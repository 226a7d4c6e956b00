//! Staged, atomically committed writes against a [`FieldStore`].

use std::collections::HashMap;

use handle_trait::Handle;

use super::{Cell, CellKey, FieldStore, StoreError, gate::CommitPermit};
use crate::{
    Result,
    field::{FieldState, LeafState},
    form::{FormId, FormState},
    path::FieldPath,
};

/// A batch of reads and writes that becomes visible as a unit.
///
/// Reads see this transaction's own staged writes first and fall back to the
/// store's committed state. Writes stay local until [`commit`](Self::commit).
/// Dropping a transaction without committing discards everything it staged.
///
/// A transaction holds the store's commit gate for its whole life, so no
/// other thread commits between its reads and its commit.
pub struct Transaction {
    store: FieldStore,
    _permit: CommitPermit,
    /// Keys in first-write order; drives notification order on commit.
    order: Vec<CellKey>,
    /// Staged contents. `None` resets the cell to its default.
    staged: HashMap<CellKey, Option<Cell>>,
}

impl Transaction {
    pub(crate) fn new(store: FieldStore) -> Self {
        Self {
            _permit: CommitPermit::acquire(&store),
            store,
            order: Vec::new(),
            staged: HashMap::new(),
        }
    }

    /// The store this transaction commits to.
    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    /// Reads a cell, preferring staged contents.
    pub fn get(&self, key: &CellKey) -> Option<Cell> {
        match self.staged.get(key) {
            Some(staged) => staged.clone(),
            None => self.store.get(key),
        }
    }

    /// Stages `cell` for `key`.
    ///
    /// # Errors
    /// [`StoreError::CellKindMismatch`] if a form cell is staged under a field
    /// key or the other way round.
    pub fn set(&mut self, key: CellKey, cell: Cell) -> Result<()> {
        if key.kind_name() != cell.kind_name() {
            return Err(StoreError::CellKindMismatch {
                key: key.to_string(),
                expected: key.kind_name(),
                actual: cell.kind_name(),
            }
            .into());
        }
        self.stage(key, Some(cell));
        Ok(())
    }

    /// Stages a reset of `key` back to its default contents.
    pub fn reset(&mut self, key: CellKey) {
        self.stage(key, None);
    }

    fn stage(&mut self, key: CellKey, cell: Option<Cell>) {
        if !self.staged.contains_key(&key) {
            self.order.push(key.clone());
        }
        tracing::trace!(key = %key, reset = cell.is_none(), "Staged write");
        self.staged.insert(key, cell);
    }

    /// Reads a field; default if absent.
    pub fn get_field(&self, form: &FormId, path: &FieldPath) -> FieldState {
        match self.get(&CellKey::field(form, path)) {
            Some(Cell::Field(state)) => state,
            _ => FieldState::default(),
        }
    }

    /// Stages the state of a field.
    pub fn set_field(&mut self, form: &FormId, path: &FieldPath, state: FieldState) {
        self.stage(CellKey::field(form, path), Some(Cell::Field(state)));
    }

    /// Read-modify-write of a field.
    pub fn update_field<F>(&mut self, form: &FormId, path: &FieldPath, f: F) -> Result<()>
    where
        F: FnOnce(FieldState) -> Result<FieldState>,
    {
        let next = f(self.get_field(form, path))?;
        self.set_field(form, path, next);
        Ok(())
    }

    /// Read-modify-write of a leaf.
    ///
    /// # Errors
    /// [`TreeError::NotAField`](crate::tree::TreeError::NotAField) if the node
    /// is structural.
    pub fn update_leaf<F>(&mut self, form: &FormId, path: &FieldPath, f: F) -> Result<()>
    where
        F: FnOnce(&mut LeafState) -> Result<()>,
    {
        let mut leaf = self.get_field(form, path).into_leaf(path)?;
        f(&mut leaf)?;
        self.set_field(form, path, FieldState::Field(leaf));
        Ok(())
    }

    /// Stages a reset of a field back to a default leaf.
    pub fn reset_field(&mut self, form: &FormId, path: &FieldPath) {
        self.reset(CellKey::field(form, path));
    }

    /// Reads the form-level node; default if absent.
    pub fn get_form(&self, form: &FormId) -> FormState {
        match self.get(&CellKey::form(form)) {
            Some(Cell::Form(state)) => state,
            _ => FormState::default(),
        }
    }

    /// Stages the form-level node.
    pub fn set_form(&mut self, form: &FormId, state: FormState) {
        self.stage(CellKey::form(form), Some(Cell::Form(state)));
    }

    /// Read-modify-write of the form-level node.
    pub fn update_form<F>(&mut self, form: &FormId, f: F)
    where
        F: FnOnce(&mut FormState),
    {
        let mut state = self.get_form(form);
        f(&mut state);
        self.set_form(form, state);
    }

    /// Stages a reset of the form-level node.
    pub fn reset_form(&mut self, form: &FormId) {
        self.reset(CellKey::form(form));
    }

    /// Number of distinct keys staged.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Applies every staged write at once, releases the commit gate and
    /// notifies observers.
    ///
    /// Returns the store version after the commit. An empty transaction
    /// commits nothing and leaves the version unchanged.
    pub fn commit(mut self) -> u64 {
        if self.order.is_empty() {
            return self.store.version();
        }
        let writes = std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|key| self.staged.remove(&key).map(|cell| (key, cell)))
            .collect();
        let version = self.store.apply(writes);

        let store = self.store.handle();
        drop(self);
        store.deliver_pending();
        version
    }
}
