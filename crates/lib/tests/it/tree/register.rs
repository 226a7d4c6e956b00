use formwork::{FieldState, FieldStore, Form, form::FormId, tree};

use crate::helpers::*;

fn children(form: &Form, name: &str) -> Vec<String> {
    form.field(name)
        .unwrap()
        .state()
        .children()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_nested_registration_builds_maps() {
    let form = TestContext::new().form();
    form.register(["a.b.c"]).unwrap();

    assert_eq!(form.field_ids(), vec!["a"]);
    assert!(form.field("a").unwrap().state().is_map());
    assert_eq!(children(&form, "a"), vec!["a.b"]);
    assert!(form.field("a.b").unwrap().state().is_map());
    assert_eq!(children(&form, "a.b"), vec!["a.b.c"]);
    assert!(form.field("a.b.c").unwrap().state().is_field());
}

#[test]
fn test_duplicate_registration_is_idempotent() {
    let form = TestContext::new().form();
    form.register(["a.b.c", "x"]).unwrap();
    let version = form.store().version();

    let added = form.register(["a.b.c", "a.b.c", "x"]).unwrap();
    assert!(added.is_empty());
    assert_eq!(form.field_ids(), vec!["a", "x"]);
    assert_eq!(children(&form, "a"), vec!["a.b"]);
    assert_eq!(children(&form, "a.b"), vec!["a.b.c"]);
    assert_eq!(form.store().version(), version);
}

#[test]
fn test_field_ids_keep_registration_order() {
    let form = TestContext::new().form();
    form.register(["b"]).unwrap();
    let added = form.register(["a.x", "c", "b", "a.y"]).unwrap();

    assert_eq!(added, vec!["a", "c"]);
    assert_eq!(form.field_ids(), vec!["b", "a", "c"]);
    assert_eq!(children(&form, "a"), vec!["a.x", "a.y"]);
}

#[test]
fn test_existing_list_is_not_coerced_to_map() {
    let form = TestContext::new().form();
    form.register_list("tags").unwrap();
    form.register(["tags.first"]).unwrap();

    let state = form.field("tags").unwrap().state();
    assert!(state.is_list());
    assert_eq!(children(&form, "tags"), vec!["tags.first"]);
}

#[test]
fn test_leaf_state_is_dropped_on_first_nesting() {
    let form = TestContext::new().form();
    leaf(&form, "address", "plain text", required());
    form.register(["address.street"]).unwrap();

    let state = form.field("address").unwrap().state();
    assert!(state.is_map());
    let err = form.field("address").unwrap().set_value("again").unwrap_err();
    assert!(err.is_structural_error());
}

#[test]
fn test_names_are_normalized() {
    let form = TestContext::new().form();
    form.register([".a..b."]).unwrap();
    assert_eq!(form.field_ids(), vec!["a"]);
    assert_eq!(children(&form, "a"), vec!["a.b"]);

    let err = form.register(["..."]).unwrap_err();
    assert!(err.is_path_error());
    assert_eq!(form.field_ids(), vec!["a"]);
}

#[test]
fn test_register_within_caller_transaction() {
    let store = FieldStore::new();
    let form = FormId::new("f");

    let mut tx = store.transaction();
    let added = tree::register(&mut tx, &form, ["a.b", "c"]).unwrap();
    assert_eq!(added, vec!["a", "c"]);
    // Nothing visible until commit
    assert!(store.get_form(&form).field_ids.is_empty());

    tx.commit();
    assert_eq!(store.get_form(&form).field_ids, vec!["a", "c"]);
    assert!(matches!(
        store.get_field(&form, &path("a")),
        FieldState::Map { .. }
    ));
}
