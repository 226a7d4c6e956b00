use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use formwork::{FormConfig, Validation, Value, form::SetOptions, value::ValueEq};
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_set_values_without_validation_keeps_previous_result() {
    let form = TestContext::new().form();
    leaf(&form, "x", Value::Null, required());
    let before = form.field("x").unwrap().validation().unwrap();
    assert!(!before.is_valid);

    form.set_values(&Value::from_iter([("x", 1)]), SetOptions::default().validate(false))
        .unwrap();

    assert_eq!(value_of(&form, "x"), Value::from(1));
    assert_eq!(form.field("x").unwrap().validation().unwrap(), before);
}

#[test]
fn test_set_values_validates_by_default() {
    let form = TestContext::new().form();
    leaf(&form, "x", Value::Null, required());

    form.set_values(&Value::from_iter([("x", 1)]), SetOptions::default())
        .unwrap();

    assert!(form.field("x").unwrap().validation().unwrap().is_valid);
}

#[test]
fn test_validate_on_set_config_is_the_default() {
    let ctx = TestContext::new().with_config(FormConfig::default().with_validate_on_set(false));
    let form = ctx.form();
    leaf(&form, "x", Value::Null, required());

    form.set_values(&Value::from_iter([("x", "now set")]), SetOptions::default())
        .unwrap();
    assert!(!form.field("x").unwrap().validation().unwrap().is_valid);

    form.set_values(
        &Value::from_iter([("x", "again")]),
        SetOptions::default().validate(true),
    )
    .unwrap();
    assert!(form.field("x").unwrap().validation().unwrap().is_valid);
}

#[test]
fn test_equal_values_are_skipped() {
    let form = TestContext::new().form();
    let runs = Arc::new(AtomicUsize::new(0));
    leaf(&form, "x", "same", counting(runs.clone()));
    let after_register = runs.load(Ordering::SeqCst);
    let version = form.store().version();

    form.set_values(&Value::from_iter([("x", "same")]), SetOptions::default())
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), after_register);
    assert_eq!(form.store().version(), version);

    // Case-insensitive equality treats "SAME" as unchanged too
    let case_insensitive: ValueEq = Arc::new(|a: &Value, b: &Value| {
        match (a.as_text(), b.as_text()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => a == b,
        }
    });
    form.set_values(
        &Value::from_iter([("x", "SAME")]),
        SetOptions::default().equal(case_insensitive),
    )
    .unwrap();
    assert_eq!(value_of(&form, "x"), Value::from("same"));
}

#[test]
fn test_set_values_rejects_non_map_and_shape_mismatch() {
    let form = TestContext::new().form();
    form.register(["address.street"]).unwrap();
    form.register_list("tags").unwrap();

    let err = form
        .set_values(&Value::from("oops"), SetOptions::default())
        .unwrap_err();
    assert!(err.is_type_error());

    let err = form
        .set_values(&Value::from_iter([("address", "Main")]), SetOptions::default())
        .unwrap_err();
    assert!(err.is_structural_error());

    let err = form
        .set_values(&Value::from(json!({ "tags": { "a": 1 } })), SetOptions::default())
        .unwrap_err();
    assert!(err.is_structural_error());
}

#[test]
fn test_set_values_is_one_transaction() {
    let form = TestContext::new().form();
    form.register(["a", "b"]).unwrap();
    leaf(&form, "c", Value::Null, exploding_after_first());
    let version = form.store().version();

    let err = form
        .set_values(
            &Value::from(json!({ "a": 1, "b": 2, "c": 3 })),
            SetOptions::default(),
        )
        .unwrap_err();

    assert!(err.is_validator_error());
    assert_eq!(form.store().version(), version);
    assert_eq!(value_of(&form, "a"), Value::Null);
}

/// Passes during registration, fails on any later value.
fn exploding_after_first() -> Arc<dyn formwork::Validator> {
    formwork::field::fallible_validator(|value: &Value| {
        if value.is_null() {
            Ok(Validation::valid())
        } else {
            Err("cannot validate".into())
        }
    })
}

#[test]
fn test_set_values_adds_unknown_map_keys() {
    let form = TestContext::new().form();
    form.register(["address.street"]).unwrap();

    form.set_values(
        &Value::from(json!({ "address": { "street": "Main", "zip": "12345" } })),
        SetOptions::default(),
    )
    .unwrap();

    assert_eq!(
        serde_json::Value::from(form.values()),
        json!({ "address": { "street": "Main", "zip": "12345" } })
    );
}

#[test]
fn test_set_initial_values_follows_pristine_leaves() {
    let form = TestContext::new().form();
    leaf(&form, "pristine", "old", required());
    leaf(&form, "edited", "old", required());
    form.field("edited").unwrap().set_value("mine").unwrap();

    form.set_initial_values(&Value::from(json!({ "pristine": "new", "edited": "new" })))
        .unwrap();

    assert_eq!(value_of(&form, "pristine"), Value::from("new"));
    assert_eq!(value_of(&form, "edited"), Value::from("mine"));
    assert_eq!(
        serde_json::Value::from(form.initial_values()),
        json!({ "pristine": "new", "edited": "new" })
    );
    assert!(form.dirty().fields["edited"]);
    assert!(!form.dirty().fields["pristine"]);
}

#[test]
fn test_touched_bulk_operations() {
    let form = TestContext::new().form();
    form.register(["a", "group.x", "group.y"]).unwrap();

    form.set_touched([("group", true)]).unwrap();
    let touched = form.touched();
    assert!(!touched["a"]);
    assert!(touched["group.x"] && touched["group.y"]);

    form.set_all_to_touched().unwrap();
    assert!(form.touched().values().all(|t| *t));

    form.reset_touched().unwrap();
    assert!(form.touched().values().all(|t| !*t));
}
