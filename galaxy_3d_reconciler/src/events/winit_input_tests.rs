/// Unit tests for winit input translation.

use std::rc::Rc;
use std::time::{Duration, Instant};
use glam::Vec2;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use crate::events::{EventName, PointerInput};
use crate::registry::Registry;
use crate::root::{RecordingRenderer, Root, RootConfig};
use crate::scheduler::SchedulerHandle;

fn names(events: &[(EventName, crate::events::NativePointerEvent)]) -> Vec<EventName> {
    events.iter().map(|(name, _)| *name).collect()
}

fn device() -> DeviceId {
    DeviceId::dummy()
}

// ============================================================================
// BUTTONS
// ============================================================================

#[test]
fn test_press_release_yields_click() {
    let mut input = PointerInput::new();
    let now = Instant::now();
    input.cursor_moved(Vec2::new(5.0, 6.0));

    assert_eq!(names(&input.button(0, true, now)), vec![EventName::PointerDown]);
    let released = input.button(0, false, now);

    assert_eq!(names(&released), vec![EventName::PointerUp, EventName::Click]);
    assert_eq!(released[1].1.offset, Vec2::new(5.0, 6.0));
}

#[test]
fn test_secondary_button_yields_context_menu() {
    let mut input = PointerInput::new();
    let now = Instant::now();
    input.button(2, true, now);
    let released = input.button(2, false, now);
    assert_eq!(names(&released), vec![EventName::PointerUp, EventName::ContextMenu]);
    assert_eq!(released[0].1.button, 2);
}

#[test]
fn test_release_without_press_is_only_pointer_up() {
    let mut input = PointerInput::new();
    assert_eq!(names(&input.button(0, false, Instant::now())), vec![EventName::PointerUp]);
}

#[test]
fn test_double_click_within_interval() {
    let mut input = PointerInput::new();
    let start = Instant::now();
    input.button(0, true, start);
    input.button(0, false, start);
    input.button(0, true, start + Duration::from_millis(100));
    let second = input.button(0, false, start + Duration::from_millis(150));

    assert_eq!(
        names(&second),
        vec![EventName::PointerUp, EventName::Click, EventName::DoubleClick]
    );
}

#[test]
fn test_slow_clicks_are_not_double() {
    let mut input = PointerInput::new();
    let start = Instant::now();
    input.button(0, true, start);
    input.button(0, false, start);
    input.button(0, true, start + Duration::from_millis(500));
    let second = input.button(0, false, start + Duration::from_millis(500));

    assert_eq!(names(&second), vec![EventName::PointerUp, EventName::Click]);
}

// ============================================================================
// WINDOW EVENTS
// ============================================================================

#[test]
fn test_cursor_moved_uses_logical_pixels() {
    let mut input = PointerInput::new();
    input.set_scale_factor(2.0);
    let event = WindowEvent::CursorMoved { device_id: device(), position: PhysicalPosition::new(200.0, 100.0) };

    let events = input.translate(&event);

    assert_eq!(names(&events), vec![EventName::PointerMove]);
    assert_eq!(events[0].1.offset, Vec2::new(100.0, 50.0));
}

#[test]
fn test_mouse_input_maps_buttons() {
    let mut input = PointerInput::new();
    let event = WindowEvent::MouseInput {
        device_id: device(),
        state: ElementState::Pressed,
        button: MouseButton::Middle,
    };
    let events = input.translate(&event);
    assert_eq!(names(&events), vec![EventName::PointerDown]);
    assert_eq!(events[0].1.button, 1);
}

#[test]
fn test_wheel_lines_scale_to_pixels() {
    let mut input = PointerInput::new();
    let event = WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::LineDelta(0.0, 1.0),
        phase: TouchPhase::Moved,
    };
    let events = input.translate(&event);
    assert_eq!(names(&events), vec![EventName::Wheel]);
    assert!(events[0].1.wheel_delta.y < 0.0);
}

#[test]
fn test_cursor_left_yields_pointer_leave() {
    let mut input = PointerInput::new();
    let events = input.translate(&WindowEvent::CursorLeft { device_id: device() });
    assert_eq!(names(&events), vec![EventName::PointerLeave]);
}

#[test]
fn test_unrelated_window_event_is_ignored() {
    let mut input = PointerInput::new();
    assert!(input.translate(&WindowEvent::Focused(true)).is_empty());
}

// ============================================================================
// ROOT INTEGRATION
// ============================================================================

#[test]
fn test_root_resizes_and_dispatches() {
    let mut root = Root::new(
        Rc::new(Registry::with_builtins()),
        RootConfig::default(),
        Box::new(RecordingRenderer::new()),
        SchedulerHandle::new(),
    )
    .unwrap();
    let mut input = PointerInput::new();

    root.handle_window_event(&mut input, &WindowEvent::Resized(PhysicalSize::new(400, 200)))
        .unwrap();
    assert_eq!(root.size().width, 400.0);
    assert_eq!(root.size().height, 200.0);

    let moved = WindowEvent::CursorMoved { device_id: device(), position: PhysicalPosition::new(200.0, 100.0) };
    root.handle_window_event(&mut input, &moved).unwrap();
    assert_eq!(root.pointer(), Vec2::ZERO);
}
