use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    thread,
};

use formwork::{
    FieldState, Value,
    form::FormId,
    store::{CellKey, Change},
};

use crate::helpers::*;

const THREADS: usize = 4;

#[test]
fn test_concurrent_register_keeps_every_id() {
    let form = TestContext::new().form();
    let per_thread = 250;

    thread::scope(|scope| {
        for t in 0..THREADS {
            let form = &form;
            scope.spawn(move || {
                for i in 0..per_thread {
                    let added = form.register([format!("f{t}_{i}.leaf")]).unwrap();
                    assert_eq!(added, vec![format!("f{t}_{i}")]);
                }
            });
        }
    });

    let ids = form.field_ids();
    assert_eq!(ids.len(), THREADS * per_thread);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());

    for id in &ids {
        let node = form.field(id).unwrap().state();
        assert!(node.is_map(), "{id} is not a map");
        assert_eq!(node.children(), &[path(&format!("{id}.leaf"))]);
    }
}

#[test]
fn test_concurrent_list_adds_keep_every_row() {
    let form = TestContext::new().form();
    let tags = form.register_list("tags").unwrap();
    let per_thread = 100;

    let added: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let tags = &tags;
                scope.spawn(move || {
                    (0..per_thread)
                        .map(|_| tags.add().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect()
    });

    let children = tags.children();
    assert_eq!(children.len(), THREADS * per_thread);
    let stored: HashSet<_> = children.iter().collect();
    assert_eq!(stored.len(), children.len());
    assert!(added.iter().all(|child| stored.contains(child)));
}

#[test]
fn test_add_never_fails_while_list_is_cleared() {
    let form = TestContext::new().form();
    let tags = form.register_list("tags").unwrap();
    for _ in 0..10 {
        tags.add().unwrap();
    }

    thread::scope(|scope| {
        let adder = scope.spawn(|| {
            for _ in 0..500 {
                tags.add().unwrap();
            }
        });
        let clearer = scope.spawn(|| {
            for _ in 0..500 {
                tags.remove_all().unwrap();
            }
        });
        adder.join().unwrap();
        clearer.join().unwrap();
    });

    // Every surviving row is one the adder appended after the last clear
    assert!(tags.len() <= 500);
}

#[test]
fn test_observers_see_commits_in_version_order() {
    let ctx = TestContext::new();
    let form = ctx.form();
    leaf(&form, "name", "", required());
    let per_thread = 1000;

    let versions = Arc::new(Mutex::new(Vec::new()));
    let recorded = versions.clone();
    form.subscribe("name", move |change: &Change| {
        recorded.lock().unwrap().push(change.version);
    })
    .unwrap();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let form = &form;
            scope.spawn(move || {
                let name = form.field("name").unwrap();
                for i in 0..per_thread {
                    name.set_value(format!("{t}-{i}")).unwrap();
                }
            });
        }
    });

    let versions = versions.lock().unwrap();
    assert_eq!(versions.len(), THREADS * per_thread);
    assert!(
        versions.windows(2).all(|pair| pair[0] < pair[1]),
        "observer saw commits out of order"
    );
    assert_eq!(versions.last().copied(), Some(ctx.store().version()));
}

#[test]
fn test_observer_may_commit_from_inside_delivery() {
    let ctx = TestContext::new();
    let store = ctx.store().clone();
    let form = FormId::new("f");
    let (a, b) = (path("a"), path("b"));

    // Mirrors every write of `a` into `b`
    let writer = store.clone();
    let (form_in_observer, b_in_observer) = (form.clone(), b.clone());
    store.subscribe(CellKey::field(&form, &a), move |change: &Change| {
        let Some(FieldState::Field(leaf)) = change.cell.as_field().cloned() else {
            return;
        };
        writer
            .atomic(|tx| {
                tx.update_leaf(&form_in_observer, &b_in_observer, |mirror| {
                    mirror.value = leaf.value.clone();
                    Ok(())
                })
            })
            .unwrap();
    });
    let log = ChangeLog::default();
    store.subscribe(CellKey::field(&form, &b), log.observer());

    thread::scope(|scope| {
        for t in 0..THREADS {
            let (store, form, a) = (&store, &form, &a);
            scope.spawn(move || {
                for i in 0..100 {
                    store
                        .atomic(|tx| {
                            tx.update_leaf(form, a, |leaf| {
                                leaf.value = Value::from(format!("{t}-{i}"));
                                Ok(())
                            })
                        })
                        .unwrap();
                }
            });
        }
    });

    let mirrored = log.changes();
    assert_eq!(mirrored.len(), THREADS * 100);
    assert!(mirrored.windows(2).all(|pair| pair[0].version < pair[1].version));
    assert_eq!(
        store.get_field(&form, &b).as_leaf().unwrap().value,
        store.get_field(&form, &a).as_leaf().unwrap().value
    );
}
