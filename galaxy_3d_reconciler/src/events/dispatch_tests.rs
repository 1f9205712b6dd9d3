/// Unit tests for pointer dispatch.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;
use glam::{Vec2, Vec3};
use crate::events::{EventName, HandlerKind, Intersection, IntersectionOrder, NativePointerEvent, PointerEvent};
use crate::instance::{InstanceKey, Props};
use crate::registry::Registry;
use crate::root::{EventConfig, Frameloop, RecordingRenderer, Root, RootConfig};
use crate::scheduler::SchedulerHandle;
use crate::value::Value;

type Log = Rc<RefCell<Vec<String>>>;

fn test_root() -> Root {
    let config = RootConfig { frameloop: Frameloop::Demand, ..Default::default() };
    Root::new(
        Rc::new(Registry::with_builtins()),
        config,
        Box::new(RecordingRenderer::new()),
        SchedulerHandle::new(),
    )
    .unwrap()
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Handler recording `label:Kind`
fn record(log: &Log, label: &str) -> Value {
    let log = log.clone();
    let label = label.to_string();
    Value::Handler(Rc::new(move |event: &mut PointerEvent| {
        log.borrow_mut().push(format!("{}:{:?}", label, event.kind));
    }))
}

fn handlers(log: &Log, label: &str, kinds: &[HandlerKind]) -> Props {
    kinds
        .iter()
        .map(|kind| (kind.prop_name().to_string(), record(log, label)))
        .collect()
}

/// Unit box mesh at `position` appended to `parent`
fn box_mesh(root: &mut Root, parent: InstanceKey, position: Vec3, mut declared: Props) -> InstanceKey {
    declared.insert("position".to_string(), Value::Vec3(position));
    let mesh = root.create_instance("mesh", declared).unwrap();
    let geometry = root.create_instance("boxGeometry", Props::new()).unwrap();
    let material = root.create_instance("meshBasicMaterial", Props::new()).unwrap();
    root.append_child(mesh, geometry).unwrap();
    root.append_child(mesh, material).unwrap();
    root.append_child(parent, mesh).unwrap();
    mesh
}

/// Surface pixel where a world point projects
fn screen_of(root: &Root, point: Vec3) -> NativePointerEvent {
    let camera_world = root.objects().world_matrix(root.camera());
    let projection = root.object(root.camera()).unwrap().projection_matrix().unwrap();
    let ndc = (projection * camera_world.inverse()).project_point3(point);
    let size = root.size();
    NativePointerEvent::at((ndc.x + 1.0) / 2.0 * size.width, (1.0 - ndc.y) / 2.0 * size.height)
}

fn center() -> NativePointerEvent {
    NativePointerEvent::at(400.0, 300.0)
}

fn corner() -> NativePointerEvent {
    NativePointerEvent::at(10.0, 10.0)
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

// ============================================================================
// DELIVERY
// ============================================================================

#[test]
fn test_pointer_down_reaches_struck_mesh() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "a", &[HandlerKind::PointerDown]));

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(entries(&log), vec!["a:PointerDown"]);
    assert_eq!(root.pointer(), Vec2::ZERO);
}

#[test]
fn test_event_carries_hit_data() {
    let mut root = test_root();
    let seen: Rc<RefCell<Vec<PointerEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut declared = Props::new();
    declared.insert(
        "onPointerDown".to_string(),
        Value::Handler(Rc::new(move |event: &mut PointerEvent| sink.borrow_mut().push(event.clone()))),
    );
    let scene = root.scene();
    let mesh = box_mesh(&mut root, scene, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    let events = seen.borrow();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    let object = root.object_of(mesh).unwrap();
    assert_eq!(event.object(), Some(object));
    assert_eq!(event.event_object(), Some(object));
    assert_eq!(event.camera, root.camera());
    // Camera at z=5, box front face at z=0.5
    assert!((event.intersection.as_ref().unwrap().distance - 4.5).abs() < 1e-3);
    assert!(event.unprojected_point.x.abs() < 1e-4);
    assert!(event.unprojected_point.z < 5.0);
}

#[test]
fn test_hits_bubble_to_handler_ancestors() {
    let mut root = test_root();
    let log = new_log();
    let group = root
        .create_instance("group", handlers(&log, "group", &[HandlerKind::PointerDown]))
        .unwrap();
    let scene = root.scene();
    root.append_child(scene, group).unwrap();
    box_mesh(&mut root, group, Vec3::ZERO, Props::new());

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(entries(&log), vec!["group:PointerDown"]);
}

#[test]
fn test_nested_handlers_are_deduplicated() {
    let mut root = test_root();
    let counts: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let handler = {
        let counts = counts.clone();
        Value::Handler(Rc::new(move |event: &mut PointerEvent| {
            counts.borrow_mut().push(event.intersections.len());
        }))
    };
    let mut declared = Props::new();
    declared.insert("onPointerDown".to_string(), handler.clone());
    let group = root.create_instance("group", declared.clone()).unwrap();
    let scene = root.scene();
    root.append_child(scene, group).unwrap();
    box_mesh(&mut root, group, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    // One raw hit, delivered to the mesh then the group
    assert_eq!(*counts.borrow(), vec![2, 2]);
}

#[test]
fn test_nearest_hit_first() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::new(0.0, 0.0, -3.0), handlers(&log, "far", &[HandlerKind::PointerDown]));
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "near", &[HandlerKind::PointerDown]));

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(entries(&log), vec!["near:PointerDown", "far:PointerDown"]);
}

#[test]
fn test_custom_order_reorders_hits() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::new(0.0, 0.0, -3.0), handlers(&log, "far", &[HandlerKind::PointerDown]));
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "near", &[HandlerKind::PointerDown]));
    let farthest_first: IntersectionOrder = Rc::new(|a: &Intersection, b: &Intersection| {
        b.distance.partial_cmp(&a.distance).unwrap_or(Ordering::Equal)
    });
    root.set_events(EventConfig { order: Some(farthest_first), ..Default::default() });

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(entries(&log), vec!["far:PointerDown", "near:PointerDown"]);
}

#[test]
fn test_stop_propagation_blocks_farther_hits() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::new(0.0, 0.0, -3.0), handlers(&log, "far", &[HandlerKind::PointerDown]));
    let mut declared = Props::new();
    let near_log = log.clone();
    declared.insert(
        "onPointerDown".to_string(),
        Value::Handler(Rc::new(move |event: &mut PointerEvent| {
            near_log.borrow_mut().push("near".to_string());
            event.stop_propagation();
        })),
    );
    box_mesh(&mut root, scene, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(entries(&log), vec!["near"]);
}

#[test]
fn test_disabled_events_dispatch_nothing() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "a", &[HandlerKind::PointerDown]));
    root.set_events(EventConfig { enabled: false, ..Default::default() });

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert!(entries(&log).is_empty());
}

#[test]
fn test_handler_invalidate_requests_frame() {
    let mut root = test_root();
    let mut declared = Props::new();
    declared.insert(
        "onPointerDown".to_string(),
        Value::Handler(Rc::new(|event: &mut PointerEvent| event.invalidate())),
    );
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, declared);
    root.render_frame(0.0).unwrap();
    assert_eq!(root.frames(), 0);

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(root.frames(), 1);
}

// ============================================================================
// HOVER
// ============================================================================

#[test]
fn test_hover_sequence_between_two_objects() {
    let mut root = test_root();
    let log = new_log();
    let hover = [
        HandlerKind::PointerOver,
        HandlerKind::PointerEnter,
        HandlerKind::PointerOut,
        HandlerKind::PointerLeave,
    ];
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::new(-2.0, 0.0, 0.0), handlers(&log, "a", &hover));
    box_mesh(&mut root, scene, Vec3::new(2.0, 0.0, 0.0), handlers(&log, "b", &hover));
    let over_a = screen_of(&root, Vec3::new(-2.0, 0.0, 0.0));
    let over_b = screen_of(&root, Vec3::new(2.0, 0.0, 0.0));

    root.handle_pointer(EventName::PointerMove, &over_a).unwrap();
    assert_eq!(root.hovered().len(), 1);
    root.handle_pointer(EventName::PointerMove, &center()).unwrap();
    assert!(root.hovered().is_empty());
    root.handle_pointer(EventName::PointerMove, &over_b).unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "a:PointerOver",
            "a:PointerEnter",
            "a:PointerOut",
            "a:PointerLeave",
            "b:PointerOver",
            "b:PointerEnter",
        ]
    );
}

#[test]
fn test_hover_fires_once_while_pointer_stays() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(
        &mut root,
        scene,
        Vec3::ZERO,
        handlers(&log, "a", &[HandlerKind::PointerOver, HandlerKind::PointerMove]),
    );

    root.handle_pointer(EventName::PointerMove, &center()).unwrap();
    root.handle_pointer(EventName::PointerMove, &NativePointerEvent::at(401.0, 300.0)).unwrap();

    assert_eq!(entries(&log), vec!["a:PointerOver", "a:PointerMove", "a:PointerMove"]);
}

#[test]
fn test_pointer_leave_clears_hover() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(
        &mut root,
        scene,
        Vec3::ZERO,
        handlers(&log, "a", &[HandlerKind::PointerOver, HandlerKind::PointerLeave]),
    );
    root.handle_pointer(EventName::PointerMove, &center()).unwrap();

    root.handle_pointer(EventName::PointerLeave, &center()).unwrap();

    assert!(root.hovered().is_empty());
    assert_eq!(entries(&log), vec!["a:PointerOver", "a:PointerLeave"]);
}

#[test]
fn test_stopped_hover_shields_farther_objects() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(
        &mut root,
        scene,
        Vec3::new(0.0, 0.0, -3.0),
        handlers(&log, "far", &[HandlerKind::PointerOver, HandlerKind::PointerOut]),
    );
    let mut declared = handlers(&log, "near", &[HandlerKind::PointerOut]);
    let near_log = log.clone();
    declared.insert(
        "onPointerOver".to_string(),
        Value::Handler(Rc::new(move |event: &mut PointerEvent| {
            near_log.borrow_mut().push("near:PointerOver".to_string());
            event.stop_propagation();
        })),
    );
    box_mesh(&mut root, scene, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerMove, &center()).unwrap();
    root.handle_pointer(EventName::PointerMove, &NativePointerEvent::at(401.0, 300.0)).unwrap();

    assert_eq!(entries(&log), vec!["near:PointerOver"]);
    assert_eq!(root.hovered().len(), 1);
}

/// `onPointerDown` that stops propagation without recording
fn stopper() -> Value {
    Value::Handler(Rc::new(|event: &mut PointerEvent| event.stop_propagation()))
}

#[test]
fn test_hovered_stopper_flushes_farther_hover() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(
        &mut root,
        scene,
        Vec3::new(0.0, 0.0, -3.0),
        handlers(&log, "far", &[HandlerKind::PointerOver, HandlerKind::PointerOut]),
    );
    let mut declared = handlers(&log, "near", &[HandlerKind::PointerOver]);
    declared.insert("onPointerDown".to_string(), stopper());
    box_mesh(&mut root, scene, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerMove, &center()).unwrap();
    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(entries(&log), vec!["near:PointerOver", "far:PointerOver", "far:PointerOut"]);
}

#[test]
fn test_unhovered_stopper_keeps_farther_hover() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(
        &mut root,
        scene,
        Vec3::new(0.0, 0.0, -3.0),
        handlers(&log, "far", &[HandlerKind::PointerOver, HandlerKind::PointerOut]),
    );
    let mut declared = Props::new();
    declared.insert("onPointerDown".to_string(), stopper());
    box_mesh(&mut root, scene, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerMove, &center()).unwrap();
    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    assert_eq!(entries(&log), vec!["far:PointerOver"]);
}

// ============================================================================
// CLICKS AND MISSES
// ============================================================================

#[test]
fn test_click_requires_pointer_down_on_same_object() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "a", &[HandlerKind::Click]));

    root.handle_pointer(EventName::PointerDown, &corner()).unwrap();
    root.handle_pointer(EventName::Click, &center()).unwrap();
    assert!(entries(&log).is_empty());

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();
    root.handle_pointer(EventName::Click, &center()).unwrap();
    assert_eq!(entries(&log), vec!["a:Click"]);
}

#[test]
fn test_click_on_empty_space_notifies_missed() {
    let mut root = test_root();
    let log = new_log();
    let global = new_log();
    let global_sink = global.clone();
    root.set_pointer_missed(Some(Rc::new(move |_: &NativePointerEvent| {
        global_sink.borrow_mut().push("missed".to_string());
    })));
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "a", &[HandlerKind::PointerMissed]));

    root.handle_pointer(EventName::PointerDown, &corner()).unwrap();
    root.handle_pointer(EventName::Click, &NativePointerEvent::at(12.0, 10.0)).unwrap();

    assert_eq!(entries(&log), vec!["a:PointerMissed"]);
    assert_eq!(entries(&global), vec!["missed"]);
}

#[test]
fn test_dragged_click_is_not_a_miss() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "a", &[HandlerKind::PointerMissed]));

    root.handle_pointer(EventName::PointerDown, &corner()).unwrap();
    root.handle_pointer(EventName::Click, &NativePointerEvent::at(10.0, 13.0)).unwrap();

    assert!(entries(&log).is_empty());
}

#[test]
fn test_click_notifies_objects_outside_initial_hits() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, handlers(&log, "a", &[HandlerKind::Click]));
    box_mesh(
        &mut root,
        scene,
        Vec3::new(3.0, 0.0, 0.0),
        handlers(&log, "b", &[HandlerKind::PointerMissed]),
    );

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();
    root.handle_pointer(EventName::Click, &center()).unwrap();

    assert_eq!(entries(&log), vec!["b:PointerMissed", "a:Click"]);
}

// ============================================================================
// CAPTURE
// ============================================================================

#[test]
fn test_captured_object_keeps_receiving_moves() {
    let mut root = test_root();
    let log = new_log();
    let mut declared = handlers(&log, "a", &[HandlerKind::PointerMove, HandlerKind::PointerUp]);
    declared.insert(
        "onPointerDown".to_string(),
        Value::Handler(Rc::new(|event: &mut PointerEvent| event.set_pointer_capture())),
    );
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();
    assert_eq!(root.captured().map(|c| c.len()), Some(1));

    root.handle_pointer(EventName::PointerMove, &corner()).unwrap();
    root.handle_pointer(EventName::PointerUp, &corner()).unwrap();

    assert_eq!(entries(&log), vec!["a:PointerMove", "a:PointerUp"]);
    assert!(root.captured().is_none());
}

#[test]
fn test_release_pointer_capture() {
    let mut root = test_root();
    let mut declared = Props::new();
    declared.insert(
        "onPointerDown".to_string(),
        Value::Handler(Rc::new(|event: &mut PointerEvent| event.set_pointer_capture())),
    );
    declared.insert(
        "onPointerMove".to_string(),
        Value::Handler(Rc::new(|event: &mut PointerEvent| event.release_pointer_capture())),
    );
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, declared);

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();
    root.handle_pointer(EventName::PointerMove, &center()).unwrap();

    assert!(root.captured().is_none());
}

#[test]
fn test_stop_propagation_ignored_for_uncaptured_hit() {
    let mut root = test_root();
    let log = new_log();
    let scene = root.scene();
    let mut far = handlers(&log, "far", &[HandlerKind::PointerMove]);
    far.insert(
        "onPointerDown".to_string(),
        Value::Handler(Rc::new(|event: &mut PointerEvent| event.set_pointer_capture())),
    );
    box_mesh(&mut root, scene, Vec3::new(0.0, 0.0, -3.0), far);
    let mut near = Props::new();
    let near_log = log.clone();
    near.insert(
        "onPointerMove".to_string(),
        Value::Handler(Rc::new(move |event: &mut PointerEvent| {
            near_log.borrow_mut().push("near:PointerMove".to_string());
            event.stop_propagation();
        })),
    );
    box_mesh(&mut root, scene, Vec3::ZERO, near);

    root.handle_pointer(EventName::PointerDown, &center()).unwrap();
    root.handle_pointer(EventName::PointerMove, &center()).unwrap();

    assert_eq!(entries(&log), vec!["near:PointerMove", "far:PointerMove"]);
}

#[test]
fn test_lost_capture_clears_hover() {
    let mut root = test_root();
    let log = new_log();
    let mut declared = handlers(&log, "a", &[HandlerKind::PointerOver, HandlerKind::PointerOut]);
    declared.insert(
        "onPointerDown".to_string(),
        Value::Handler(Rc::new(|event: &mut PointerEvent| event.set_pointer_capture())),
    );
    let scene = root.scene();
    box_mesh(&mut root, scene, Vec3::ZERO, declared);
    root.handle_pointer(EventName::PointerMove, &center()).unwrap();
    root.handle_pointer(EventName::PointerDown, &center()).unwrap();

    root.handle_pointer(EventName::LostPointerCapture, &center()).unwrap();

    assert!(root.captured().is_none());
    assert!(root.hovered().is_empty());
    assert_eq!(entries(&log), vec!["a:PointerOver", "a:PointerOut"]);
}
