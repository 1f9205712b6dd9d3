/// Unit tests for Registry.

use std::cell::Cell;
use std::rc::Rc;
use crate::error::Error;
use crate::registry::{Constructor, Registry};
use crate::scene::{NativeObject, NodeKind};
use crate::value::Value;

// ============================================================================
// NAMES
// ============================================================================

#[test]
fn test_canonical_name_uppercases_first_char() {
    assert_eq!(Registry::canonical_name("mesh"), "Mesh");
    assert_eq!(Registry::canonical_name("boxGeometry"), "BoxGeometry");
    assert_eq!(Registry::canonical_name("Group"), "Group");
    assert_eq!(Registry::canonical_name(""), "");
}

#[test]
fn test_builtins_are_registered() {
    let registry = Registry::with_builtins();
    for tag in ["mesh", "group", "scene", "boxGeometry", "meshBasicMaterial", "perspectiveCamera"] {
        assert!(registry.contains(tag), "missing {}", tag);
    }
    assert!(registry.names().contains(&"InstancedMesh".to_string()));
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[test]
fn test_unknown_tag_fails_with_tag_name() {
    let registry = Registry::new();
    let result = registry.resolve("fancyThing");
    match result {
        Err(Error::UnknownType(tag)) => assert_eq!(tag, "fancyThing"),
        _ => panic!("expected UnknownType"),
    }
}

#[test]
fn test_register_is_additive() {
    let registry = Registry::with_builtins();
    let before = registry.names().len();

    registry.register("customNode", |_| Ok(NativeObject::node("CustomNode", NodeKind::Object)));

    assert_eq!(registry.names().len(), before + 1);
    assert!(registry.contains("mesh"));
    let object = registry.construct("customNode", &[]).unwrap();
    assert_eq!(object.type_name(), "CustomNode");
}

#[test]
fn test_extend_merges_entries() {
    let registry = Registry::new();
    let constructor: Constructor = Rc::new(|_: &[Value]| Ok(NativeObject::node("Thing", NodeKind::Object)));
    registry.extend(vec![("thing".to_string(), constructor)]);
    assert!(registry.contains("Thing"));
}

// ============================================================================
// DEFAULT CACHE
// ============================================================================

#[test]
fn test_default_field_is_built_once() {
    let registry = Registry::new();
    let built = Rc::new(Cell::new(0));
    let counter = built.clone();
    registry.register("counted", move |_| {
        counter.set(counter.get() + 1);
        Ok(NativeObject::new("Counted", NodeKind::Resource).with_field("opacity", Value::from(1.0)))
    });

    assert_eq!(registry.default_field("counted", "opacity").unwrap(), Some(Value::from(1.0)));
    assert_eq!(registry.default_field("Counted", "missing").unwrap(), None);
    assert_eq!(built.get(), 1);
}

#[test]
fn test_default_field_unknown_type() {
    let registry = Registry::new();
    assert!(registry.default_field("nothing", "x").is_err());
}
