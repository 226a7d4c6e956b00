use formwork::{Validation, Value, config::ValidityMode};

use crate::helpers::*;

#[test]
fn test_validation_is_and_of_all_leaves() {
    let form = TestContext::new().form();
    leaf(&form, "name", "", required());
    leaf(&form, "email", "a@b.c", required());

    let validation = form.validation();
    assert!(!validation.is_valid);
    assert!(!validation.is_valid_strict);
    assert_eq!(validation.failing(ValidityMode::Normal), vec!["name"]);

    form.field("name").unwrap().set_value("Ada").unwrap();
    assert!(form.validation().is_valid);
}

#[test]
fn test_warnings_only_fail_strict_mode() {
    let form = TestContext::new().form();
    leaf(&form, "nick", "ab", min_len_warning(3));

    let validation = form.validation();
    assert!(validation.is_valid_for(ValidityMode::Normal));
    assert!(!validation.is_valid_for(ValidityMode::Strict));
    assert_eq!(
        validation.fields.get("nick").and_then(|v| v.message.as_deref()),
        Some("short")
    );
}

#[test]
fn test_empty_form_is_valid() {
    let form = TestContext::new().form();
    let validation = form.validation();
    assert!(validation.is_valid && validation.is_valid_strict);
    assert!(validation.fields.is_empty());
}

#[test]
fn test_unregistered_leaves_do_not_count() {
    let form = TestContext::new().form();
    leaf(&form, "gone", Value::Null, required());
    assert!(!form.validation().is_valid);

    form.unregister(["gone"]).unwrap();
    assert!(form.validation().is_valid);
}

#[test]
fn test_set_errors_merges_external_results() {
    let form = TestContext::new().form();
    form.register(["address.street", "address.city", "name"]).unwrap();

    form.set_errors([
        Validation::named("name", Validation::invalid("taken")),
        Validation::named(
            "address",
            Validation::valid().with_child("city", Validation::warning("unknown city")),
        ),
    ])
    .unwrap();

    let validation = form.validation();
    assert!(!validation.is_valid);
    assert_eq!(
        validation.fields.get("name").and_then(|v| v.message.as_deref()),
        Some("taken")
    );
    assert!(!validation.fields["address.city"].is_valid_strict);
    assert!(validation.fields["address.street"].is_valid_strict);
}
