//! List nodes and row identity recycling.
//!
//! Each list child is named `<list>.<id>`. Ids released by removals go back
//! into a per-list [`IdPool`] and are handed out again by later additions, so
//! the number of distinct cells a list ever touches stays bounded by its
//! largest length. A reused id keeps whatever leaf state its cell last held;
//! list operations are purely structural and never write child values.
//!
//! Ids are released only after the removing transaction has committed, so a
//! concurrent addition can never reuse an id that is still visible.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, PoisonError},
};

use uuid::Uuid;

use crate::{
    Result,
    field::FieldState,
    form::{Form, FormId},
    path::FieldPath,
    store::Transaction,
    tree::TreeError,
};

/// Freed ids of one list.
#[derive(Debug, Clone, Default)]
pub struct IdPool {
    free: HashSet<String>,
}

impl IdPool {
    /// Removes and returns an arbitrary pooled id.
    pub fn take(&mut self) -> Option<String> {
        let id = self.free.iter().next().cloned()?;
        self.free.remove(&id);
        Some(id)
    }

    /// Returns `id` to the pool.
    pub fn release(&mut self, id: impl Into<String>) {
        self.free.insert(id.into());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.free.contains(id)
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

/// The id pools of every list in a form, keyed by list path.
#[derive(Debug, Default)]
pub struct ListPools {
    pools: Mutex<HashMap<FieldPath, IdPool>>,
}

impl ListPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// A child name for `list`: a pooled id if one is free, else a fresh one.
    pub fn generate_new_name(&self, list: &FieldPath) -> FieldPath {
        let recycled = self
            .pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(list)
            .and_then(IdPool::take);
        let id = match recycled {
            Some(id) => {
                tracing::trace!(list = %list, id = %id, "Reusing list id");
                id
            }
            None => Uuid::new_v4().simple().to_string(),
        };
        list.join(id)
    }

    /// Returns the last segment of `child` to its list's pool.
    pub fn release_name(&self, child: &FieldPath) {
        let Some(list) = child.parent() else {
            return;
        };
        self.pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(list)
            .or_default()
            .release(child.last());
    }

    /// Releases every name in `children`.
    pub fn release_all<'a>(&self, children: impl IntoIterator<Item = &'a FieldPath>) {
        for child in children {
            self.release_name(child);
        }
    }

    /// A copy of the pool of `list`.
    pub fn pooled(&self, list: &FieldPath) -> IdPool {
        self.pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(list)
            .cloned()
            .unwrap_or_default()
    }

    /// Drops every pool.
    pub fn clear(&self) {
        self.pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Reads `path` as a list inside `tx`, coercing a plain field.
///
/// # Errors
/// [`TreeError::NotAList`] if the node is a `Map`.
pub(crate) fn list_children(
    tx: &Transaction,
    form: &FormId,
    path: &FieldPath,
) -> Result<Vec<FieldPath>> {
    match tx.get_field(form, path).into_list(path)? {
        FieldState::List { children } => Ok(children),
        other => Err(TreeError::NotAList {
            path: path.to_string(),
            kind: other.kind(),
        }
        .into()),
    }
}

fn check_index(path: &FieldPath, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(TreeError::IndexOutOfBounds {
            path: path.to_string(),
            index,
            len,
        }
        .into())
    }
}

/// Structural operations on one list node of a form.
///
/// Obtained from [`Form::list`]. Every operation is one transaction.
#[derive(Debug, Clone)]
pub struct ListHandle {
    form: Form,
    path: FieldPath,
}

impl ListHandle {
    pub(crate) fn new(form: Form, path: FieldPath) -> Self {
        Self { form, path }
    }

    /// Path of the list node.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Current children, in order. A plain field reads as an empty list.
    pub fn children(&self) -> Vec<FieldPath> {
        self.form
            .store()
            .get_field(self.form.id(), &self.path)
            .children()
            .to_vec()
    }

    pub fn len(&self) -> usize {
        self.children().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` on the list's children and stages the result.
    fn with_list<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<FieldPath>) -> Result<T>,
    {
        let form = self.form.id();
        self.form.store().atomic(|tx| {
            let mut children = list_children(tx, form, &self.path)?;
            let out = f(&mut children)?;
            tx.set_field(form, &self.path, FieldState::List { children });
            Ok(out)
        })
    }

    /// Appends a child and returns its path.
    ///
    /// The append position is read inside the same transaction, so a
    /// concurrent removal cannot turn it into an out-of-range insert.
    pub fn add(&self) -> Result<FieldPath> {
        self.insert(None)
    }

    /// Inserts a child at `index` and returns its path. `index == len`
    /// appends.
    pub fn add_at(&self, index: usize) -> Result<FieldPath> {
        self.insert(Some(index))
    }

    fn insert(&self, index: Option<usize>) -> Result<FieldPath> {
        let child = self.form.pools().generate_new_name(&self.path);
        let inserted = child.clone();
        let result = self.with_list(|children| {
            let index = index.unwrap_or(children.len());
            if index > children.len() {
                return Err(TreeError::IndexOutOfBounds {
                    path: self.path.to_string(),
                    index,
                    len: children.len(),
                }
                .into());
            }
            children.insert(index, inserted);
            Ok(index)
        });
        match result {
            Ok(index) => {
                tracing::debug!(list = %self.path, child = %child, index, "Added list item");
                Ok(child)
            }
            Err(err) => {
                self.form.pools().release_name(&child);
                Err(err)
            }
        }
    }

    /// Removes the child at `index` and returns its path. Its id is released
    /// once the removal has committed.
    pub fn remove(&self, index: usize) -> Result<FieldPath> {
        let removed = self.with_list(|children| {
            check_index(&self.path, index, children.len())?;
            Ok(children.remove(index))
        })?;
        self.form.pools().release_name(&removed);
        tracing::debug!(list = %self.path, child = %removed, index, "Removed list item");
        Ok(removed)
    }

    /// Removes every child and releases their ids.
    pub fn remove_all(&self) -> Result<Vec<FieldPath>> {
        let removed = self.with_list(|children| Ok(std::mem::take(children)))?;
        self.form.pools().release_all(&removed);
        tracing::debug!(list = %self.path, count = removed.len(), "Removed all list items");
        Ok(removed)
    }

    /// Exchanges the children at `a` and `b`.
    pub fn swap(&self, a: usize, b: usize) -> Result<()> {
        self.with_list(|children| {
            check_index(&self.path, a, children.len())?;
            check_index(&self.path, b, children.len())?;
            children.swap(a, b);
            Ok(())
        })?;
        tracing::debug!(list = %self.path, a, b, "Swapped list items");
        Ok(())
    }

    /// Moves the child at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> Result<()> {
        self.with_list(|children| {
            check_index(&self.path, from, children.len())?;
            check_index(&self.path, to, children.len())?;
            if from != to {
                let item = children.remove(from);
                children.insert(to, item);
            }
            Ok(())
        })?;
        tracing::debug!(list = %self.path, from, to, "Moved list item");
        Ok(())
    }
}
