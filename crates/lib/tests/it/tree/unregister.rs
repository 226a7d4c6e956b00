use formwork::Value;

use crate::helpers::*;

#[test]
fn test_unregister_detaches_only_that_edge() {
    let form = TestContext::new().form();
    form.register(["a.b.c", "a.b.d"]).unwrap();
    form.field("a.b.c").unwrap().set_value("kept").unwrap();

    form.unregister(["a.b.c"]).unwrap();

    assert_eq!(form.field_ids(), vec!["a"]);
    let ab = form.field("a.b").unwrap().state();
    assert!(ab.is_map());
    assert_eq!(ab.children(), &[path("a.b.d")]);
    // The detached cell keeps its state until destroyed
    assert_eq!(value_of(&form, "a.b.c"), Value::from("kept"));
}

#[test]
fn test_unregister_top_level_keeps_descendants() {
    let form = TestContext::new().form();
    form.register(["a.b", "z"]).unwrap();

    form.unregister(["a"]).unwrap();

    assert_eq!(form.field_ids(), vec!["z"]);
    assert_eq!(form.field("a").unwrap().state().children(), &[path("a.b")]);
    assert_eq!(
        form.all_field_ids().iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        vec!["z"]
    );
}

#[test]
fn test_unregister_unknown_is_noop() {
    let form = TestContext::new().form();
    form.register(["a"]).unwrap();
    let version = form.store().version();

    form.unregister(["nope", "also.nope"]).unwrap();

    assert_eq!(form.field_ids(), vec!["a"]);
    assert_eq!(form.store().version(), version);
}

#[test]
fn test_reregister_after_unregister() {
    let form = TestContext::new().form();
    form.register(["a", "b"]).unwrap();
    form.unregister(["a"]).unwrap();
    form.register(["a"]).unwrap();

    assert_eq!(form.field_ids(), vec!["b", "a"]);
}
