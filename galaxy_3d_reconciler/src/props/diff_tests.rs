/// Unit tests for prop diffing.

use std::rc::Rc;
use glam::Vec3;
use crate::events::{EventHandler, HandlerKind};
use crate::instance::Props;
use crate::props::{diff_props, DiffOptions, PropKind};
use crate::value::{ArrayEquality, EqualityMode, ObjectEquality, Value};

fn props(entries: &[(&str, Value)]) -> Props {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

// ============================================================================
// BASICS
// ============================================================================

#[test]
fn test_identical_props_produce_no_changes() {
    let declared = props(&[
        ("position", Value::Vec3(Vec3::new(1.0, 2.0, 3.0))),
        ("visible", Value::Bool(true)),
        ("name", Value::from("box")),
    ]);

    let diff = diff_props(&declared, &declared.clone(), DiffOptions::default());

    assert!(diff.is_empty());
    assert_eq!(diff.memoized, declared);
}

#[test]
fn test_changed_value_is_reported() {
    let old = props(&[("visible", Value::Bool(true)), ("name", Value::from("a"))]);
    let new = props(&[("visible", Value::Bool(false)), ("name", Value::from("a"))]);

    let diff = diff_props(&new, &old, DiffOptions::default());

    assert_eq!(diff.keys(), vec!["visible"]);
    assert_eq!(diff.changes[0].kind, PropKind::Field);
}

#[test]
fn test_reserved_keys_never_appear() {
    let new = props(&[
        ("args", Value::Array(vec![Value::from(1.0)])),
        ("attach", Value::from("material")),
        ("key", Value::from("k")),
        ("dispose", Value::Null),
        ("opacity", Value::from(0.5)),
    ]);

    let diff = diff_props(&new, &Props::new(), DiffOptions::default());

    assert_eq!(diff.keys(), vec!["opacity"]);
}

#[test]
fn test_new_arrays_with_equal_elements_are_unchanged() {
    let old = props(&[("position", Value::Array(vec![Value::from(1.0), Value::from(2.0)]))]);
    let new = props(&[("position", Value::Array(vec![Value::from(1.0), Value::from(2.0)]))]);

    assert!(diff_props(&new, &old, DiffOptions::default()).is_empty());

    let strict = DiffOptions {
        equality: EqualityMode { arrays: ArrayEquality::Reference, objects: ObjectEquality::Reference },
        ..Default::default()
    };
    assert_eq!(diff_props(&new, &old, strict).keys(), vec!["position"]);
}

#[test]
fn test_handlers_are_classified() {
    let handler: EventHandler = Rc::new(|_| {});
    let new = props(&[
        ("onClick", Value::Handler(handler)),
        ("onPointerWobble", Value::Null),
        ("onUpdate", Value::Null),
    ]);

    let diff = diff_props(&new, &Props::new(), DiffOptions::default());

    assert_eq!(diff.changes[0].kind, PropKind::Handler(Some(HandlerKind::Click)));
    assert_eq!(diff.changes[1].kind, PropKind::Handler(None));
    assert_eq!(diff.changes[2].kind, PropKind::UpdateHook);
}

// ============================================================================
// PIERCED PATHS
// ============================================================================

#[test]
fn test_changed_parent_reapplies_pierced_children() {
    let old = props(&[
        ("position", Value::Vec3(Vec3::ZERO)),
        ("position-x", Value::from(4.0)),
    ]);
    let new = props(&[
        ("position", Value::Vec3(Vec3::ONE)),
        ("position-x", Value::from(4.0)),
    ]);

    let diff = diff_props(&new, &old, DiffOptions::default());

    assert_eq!(diff.keys(), vec!["position", "position-x"]);
}

#[test]
fn test_changed_path_reapplies_siblings() {
    let old = props(&[
        ("material-color", Value::from("red")),
        ("material-opacity", Value::from(0.5)),
    ]);
    let new = props(&[
        ("material-color", Value::from("blue")),
        ("material-opacity", Value::from(0.5)),
    ]);

    let diff = diff_props(&new, &old, DiffOptions::default());

    assert_eq!(diff.keys(), vec!["material-color", "material-opacity"]);
}

#[test]
fn test_each_key_appears_once() {
    let old = props(&[
        ("rotation-x", Value::from(0.0)),
        ("rotation-y", Value::from(0.0)),
    ]);
    let new = props(&[
        ("rotation-x", Value::from(1.0)),
        ("rotation-y", Value::from(2.0)),
    ]);

    let diff = diff_props(&new, &old, DiffOptions::default());

    let keys = diff.keys();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys.iter().filter(|k| **k == "rotation-x").count(), 1);
    assert_eq!(keys.iter().filter(|k| **k == "rotation-y").count(), 1);
}

// ============================================================================
// REMOVED PROPS
// ============================================================================

#[test]
fn test_removed_props_are_ignored_by_default() {
    let old = props(&[("scale", Value::from(2.0)), ("name", Value::from("n"))]);
    let new = props(&[("name", Value::from("n"))]);

    assert!(diff_props(&new, &old, DiffOptions::default()).is_empty());
}

#[test]
fn test_removed_props_reset_to_default_first() {
    let old = props(&[("scale", Value::from(2.0)), ("name", Value::from("n"))]);
    let new = props(&[("name", Value::from("m"))]);
    let options = DiffOptions { reset_removed: true, ..Default::default() };

    let diff = diff_props(&new, &old, options);

    assert_eq!(diff.keys(), vec!["scale", "name"]);
    assert!(matches!(diff.changes[0].value, Value::UseDefault));
    assert_eq!(diff.memoized, new);
}

#[test]
fn test_removed_reserved_keys_are_not_reset() {
    let old = props(&[("attach", Value::from("material")), ("args", Value::Array(vec![]))]);
    let options = DiffOptions { reset_removed: true, ..Default::default() };

    assert!(diff_props(&Props::new(), &old, options).is_empty());
}
