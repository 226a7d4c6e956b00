use formwork::Value;

use crate::helpers::*;

#[test]
fn test_add_appends_distinct_children() {
    let form = TestContext::new().form();
    let tags = form.register_list("tags").unwrap();

    let first = tags.add().unwrap();
    let second = tags.add().unwrap();

    assert_ne!(first, second);
    assert_eq!(tags.children(), vec![first.clone(), second.clone()]);
    assert_eq!(first.parent(), Some(path("tags")));
    assert_eq!(tags.len(), 2);
}

#[test]
fn test_add_at_inserts_and_appends() {
    let form = TestContext::new().form();
    let list = form.register_list("rows").unwrap();
    let a = list.add().unwrap();
    let b = list.add().unwrap();

    let front = list.add_at(0).unwrap();
    let back = list.add_at(3).unwrap();
    assert_eq!(list.children(), vec![front, a, b, back]);

    let err = list.add_at(9).unwrap_err();
    assert!(err.is_index_error());
    assert_eq!(list.len(), 4);
}

#[test]
fn test_swap_twice_is_identity() {
    let form = TestContext::new().form();
    let list = form.register_list("rows").unwrap();
    for _ in 0..3 {
        list.add().unwrap();
    }
    let before = list.children();

    list.swap(0, 2).unwrap();
    assert_eq!(list.children()[0], before[2]);
    list.swap(0, 2).unwrap();
    assert_eq!(list.children(), before);

    list.swap(1, 1).unwrap();
    assert_eq!(list.children(), before);
}

#[test]
fn test_move_item() {
    let form = TestContext::new().form();
    let list = form.register_list("rows").unwrap();
    let ids: Vec<_> = (0..4).map(|_| list.add().unwrap()).collect();

    list.move_item(2, 2).unwrap();
    assert_eq!(list.children(), ids);

    list.move_item(0, 3).unwrap();
    assert_eq!(
        list.children(),
        vec![ids[1].clone(), ids[2].clone(), ids[3].clone(), ids[0].clone()]
    );

    list.move_item(3, 0).unwrap();
    assert_eq!(list.children(), ids);

    assert!(list.move_item(0, 4).unwrap_err().is_index_error());
}

#[test]
fn test_remove_and_remove_all() {
    let form = TestContext::new().form();
    let list = form.register_list("rows").unwrap();
    let a = list.add().unwrap();
    let b = list.add().unwrap();
    let c = list.add().unwrap();

    assert_eq!(list.remove(1).unwrap(), b);
    assert_eq!(list.children(), vec![a.clone(), c.clone()]);
    assert!(list.remove(2).unwrap_err().is_index_error());

    let removed = list.remove_all().unwrap();
    assert_eq!(removed, vec![a, c]);
    assert!(list.is_empty());
}

#[test]
fn test_list_operations_never_touch_child_values() {
    let form = TestContext::new().form();
    let list = form.register_list("rows").unwrap();
    let a = list.add().unwrap();
    let b = list.add().unwrap();
    form.field(a.as_str()).unwrap().set_value("first").unwrap();
    form.field(b.as_str()).unwrap().set_value("second").unwrap();

    list.swap(0, 1).unwrap();

    assert_eq!(value_of(&form, a.as_str()), Value::from("first"));
    assert_eq!(
        form.values().get("rows"),
        Some(&Value::List(vec!["second".into(), "first".into()]))
    );
}

#[test]
fn test_list_ops_coerce_plain_field_but_not_map() {
    let form = TestContext::new().form();
    form.register(["plain", "address.street"]).unwrap();

    let plain = form.list("plain").unwrap();
    plain.add().unwrap();
    assert!(form.field("plain").unwrap().state().is_list());

    let err = form.list("address").unwrap().add().unwrap_err();
    assert!(err.is_structural_error());
    assert!(form.register_list("address").unwrap_err().is_structural_error());
    assert!(form.field("address").unwrap().state().is_map());
}
