use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use formwork::{
    FieldState, FieldStore, Value,
    form::FormId,
    store::{CellKey, Change},
};

use crate::helpers::*;

#[test]
fn test_one_notification_per_key_per_commit() {
    let store = FieldStore::new();
    let form = FormId::new("f");
    let name = path("name");
    let log = ChangeLog::default();
    store.subscribe(CellKey::field(&form, &name), log.observer());

    store
        .atomic(|tx| {
            for i in 0..5 {
                tx.update_leaf(&form, &name, |leaf| {
                    leaf.value = Value::from(i);
                    Ok(())
                })?;
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(log.len(), 1);
    let change = &log.changes()[0];
    assert_eq!(change.version, 1);
    assert_eq!(
        change.cell.as_field().unwrap().as_leaf().unwrap().value,
        Value::from(4)
    );
}

#[test]
fn test_observer_sees_whole_transaction() {
    let store = FieldStore::new();
    let form = FormId::new("f");
    let (a, b) = (path("a"), path("b"));

    // When `a` changes, `b` must already hold the value written in the same
    // transaction.
    let seen = Arc::new(AtomicU64::new(0));
    let reader = store.clone();
    let seen_in_observer = seen.clone();
    let form_in_observer = form.clone();
    let b_in_observer = b.clone();
    store.subscribe(CellKey::field(&form, &a), move |_: &Change| {
        let b_value = reader
            .get_field(&form_in_observer, &b_in_observer)
            .as_leaf()
            .and_then(|leaf| leaf.value.as_int())
            .unwrap_or_default();
        seen_in_observer.store(b_value as u64, Ordering::SeqCst);
    });

    store
        .atomic(|tx| {
            tx.update_leaf(&form, &a, |leaf| {
                leaf.value = Value::from(1);
                Ok(())
            })?;
            tx.update_leaf(&form, &b, |leaf| {
                leaf.value = Value::from(42);
                Ok(())
            })
        })
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 42);
}

#[test]
fn test_failed_transaction_notifies_nobody() {
    let store = FieldStore::new();
    let form = FormId::new("f");
    let name = path("name");
    let log = ChangeLog::default();
    store.subscribe(CellKey::field(&form, &name), log.observer());

    let result = store.atomic(|tx| {
        tx.update_leaf(&form, &name, |leaf| {
            leaf.validator = exploding();
            leaf.revalidate(&path("name"))
        })
    });

    assert!(result.unwrap_err().is_validator_error());
    assert_eq!(log.len(), 0);
}

#[test]
fn test_changes_arrive_in_staging_order() {
    let store = FieldStore::new();
    let form = FormId::new("f");
    let log = ChangeLog::default();
    for name in ["c", "a", "b"] {
        store.subscribe(CellKey::field(&form, &path(name)), log.observer());
    }

    store
        .atomic(|tx| {
            for name in ["c", "a", "b"] {
                tx.set_field(&form, &path(name), FieldState::default());
            }
            Ok(())
        })
        .unwrap();

    let order: Vec<String> = log
        .changes()
        .iter()
        .map(|change| change.key.to_string())
        .collect();
    assert_eq!(order, vec!["f/c", "f/a", "f/b"]);
}

#[test]
fn test_unsubscribe() {
    let store = FieldStore::new();
    let form = FormId::new("f");
    let log = ChangeLog::default();
    let id = store.subscribe(CellKey::form(&form), log.observer());

    store.unsubscribe(id).unwrap();
    store
        .atomic(|tx| {
            tx.update_form(&form, |state| {
                state.add_field_id("x");
            });
            Ok(())
        })
        .unwrap();
    assert_eq!(log.len(), 0);

    let err = store.unsubscribe(id).unwrap_err();
    assert!(err.is_not_found());
}
