//! The registration engine.
//!
//! Turns batches of (possibly dotted) field names into structural mutations
//! of the field tree. Both [`register`] and [`unregister`] operate on a
//! caller-supplied [`Transaction`], so a whole batch commits as one unit and
//! no reader observes a top-level id without its nodes, or the reverse.
//!
//! Registration is idempotent. A mount-triggered registration racing an
//! imperative one for the same name leaves exactly one child edge and one
//! top-level id, in the order of the first registration.

mod errors;
pub use errors::TreeError;

pub mod traversal;

use crate::{Result, form::FormId, path::FieldPath, store::Transaction};

/// Registers `names` in `form`.
///
/// For `"a.b.c"`:
/// 1. `"a"` is queued as a top-level field id.
/// 2. `"a"` is coerced to a `Map` (unless already a `Map` or `List`) and
///    gains child `"a.b"` if absent.
/// 3. `"a.b"` likewise gains child `"a.b.c"`.
///
/// After the batch, queued top-level ids that are not yet registered are
/// appended to the form's `field_ids` in input order.
///
/// Returns the top-level ids that were newly added. Nothing is staged for
/// nodes that already have the required shape and children, so registering
/// an already registered name commits nothing.
pub fn register<I, S>(tx: &mut Transaction, form: &FormId, names: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pending: Vec<String> = Vec::new();

    for name in names {
        let path = FieldPath::parse(name)?;
        let top = path.first().to_string();
        if !pending.contains(&top) {
            pending.push(top);
        }

        let mut child_chain = path.ancestors();
        child_chain.push(path.clone());
        for pair in child_chain.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            let node = tx.get_field(form, parent);
            let coerced = node.is_field();
            let mut node = node.into_map();
            let attached = node.add_child(child.clone());
            if attached {
                tracing::trace!(form = %form, parent = %parent, child = %child, "Attached child");
            }
            if coerced || attached {
                tx.set_field(form, parent, node);
            }
        }
    }

    let known = tx.get_form(form).field_ids;
    pending.retain(|id| !known.contains(id));
    if !pending.is_empty() {
        tx.update_form(form, |state| {
            for id in &pending {
                state.add_field_id(id);
            }
        });
    }

    tracing::debug!(form = %form, added = ?pending, "Registered fields");
    Ok(pending)
}

/// Unregisters `names` from `form`.
///
/// Top-level names leave the form's `field_ids`; dotted names are detached
/// from their immediate parent. Descendant cells are neither removed nor
/// reset and stay addressable until explicitly destroyed. Unknown names are
/// ignored.
pub fn unregister<I, S>(tx: &mut Transaction, form: &FormId, names: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let paths = names
        .into_iter()
        .map(FieldPath::parse)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let top_level: Vec<&FieldPath> = paths.iter().filter(|p| p.is_top_level()).collect();
    if !top_level.is_empty() {
        let form_state = tx.get_form(form);
        if top_level
            .iter()
            .any(|p| form_state.field_ids.iter().any(|id| id == p.as_str()))
        {
            tx.update_form(form, |state| {
                for path in &top_level {
                    state.remove_field_id(path.as_str());
                }
            });
        }
    }

    for path in paths.iter().filter(|p| !p.is_top_level()) {
        let Some(parent) = path.parent() else {
            continue;
        };
        let mut node = tx.get_field(form, &parent);
        if node.remove_child(path) {
            tracing::trace!(form = %form, parent = %parent, child = %path, "Detached child");
            tx.set_field(form, &parent, node);
        }
    }

    tracing::debug!(form = %form, count = paths.len(), "Unregistered fields");
    Ok(())
}
