//! Depth-first walks over the field tree.

use crate::{field::FieldState, form::FormId, path::FieldPath, store::Transaction};

/// Collects every leaf path reachable from `roots`, depth first, in child
/// order.
///
/// `lookup` returns the state stored at a path; `None` means the cell was
/// never written, which is a default leaf.
pub fn leaf_paths<F>(roots: impl IntoIterator<Item = FieldPath>, lookup: F) -> Vec<FieldPath>
where
    F: Fn(&FieldPath) -> Option<FieldState>,
{
    let mut leaves = Vec::new();
    let mut stack: Vec<FieldPath> = roots.into_iter().collect();
    stack.reverse();

    while let Some(path) = stack.pop() {
        match lookup(&path) {
            None | Some(FieldState::Field(_)) => leaves.push(path),
            Some(FieldState::Map { children }) | Some(FieldState::List { children }) => {
                // Children always extend their parent's path. Anything else
                // would be a cycle, so it is skipped.
                stack.extend(
                    children
                        .into_iter()
                        .rev()
                        .filter(|child| child.starts_with(&path)),
                );
            }
        }
    }

    leaves
}

/// Every leaf of `form` as seen by `tx`, including its staged writes.
pub fn form_leaves(tx: &Transaction, form: &FormId) -> Vec<FieldPath> {
    let roots = tx
        .get_form(form)
        .field_ids
        .iter()
        .filter_map(|id| FieldPath::parse(id).ok())
        .collect::<Vec<_>>();
    leaf_paths(roots, |path| Some(tx.get_field(form, path)))
}

/// Leaves at or below `path` as seen by `tx`.
pub fn leaves_under(tx: &Transaction, form: &FormId, path: &FieldPath) -> Vec<FieldPath> {
    leaf_paths([path.clone()], |p| Some(tx.get_field(form, p)))
}
