/// Unit tests for the scheduler and its shared handle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use crate::error::{Error, Result};
use crate::instance::Props;
use crate::registry::Registry;
use crate::root::{Frameloop, RecordingRenderer, RootConfig, SceneRenderer};
use crate::scene::{NativeObject, NodeKind, ObjectKey, ObjectStore};
use crate::scheduler::{DisposeTask, FrameRequester, RootKey, Scheduler};

#[derive(Default)]
struct CountingRequester {
    calls: Cell<usize>,
}

impl FrameRequester for CountingRequester {
    fn request_frame(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

struct FailingRenderer;

impl SceneRenderer for FailingRenderer {
    fn render(&mut self, _objects: &ObjectStore, _scene: ObjectKey, _camera: ObjectKey) -> Result<()> {
        Err(Error::InvalidOperation("device lost".to_string()))
    }
}

fn config(frameloop: Frameloop) -> RootConfig {
    RootConfig { frameloop, ..Default::default() }
}

fn scheduler_with_requester() -> (Scheduler, Rc<CountingRequester>) {
    let requester = Rc::new(CountingRequester::default());
    let scheduler = Scheduler::with_frame_requester(Rc::new(Registry::with_builtins()), requester.clone());
    (scheduler, requester)
}

fn mount(scheduler: &mut Scheduler, frameloop: Frameloop) -> (RootKey, RecordingRenderer) {
    let renderer = RecordingRenderer::new();
    let key = scheduler.create_root(config(frameloop), Box::new(renderer.clone())).unwrap();
    (key, renderer)
}

fn failing_object(label: &str) -> NativeObject {
    let label = label.to_string();
    NativeObject::new("Probe", NodeKind::Resource).with_dispose(Rc::new(move |_: &NativeObject| {
        Err(Error::InvalidOperation(format!("{} refused", label)))
    }))
}

// ============================================================================
// ROOTS
// ============================================================================

#[test]
fn test_create_root_schedules_first_frame() {
    let (mut scheduler, requester) = scheduler_with_requester();
    assert!(!scheduler.is_running());

    let (key, _) = mount(&mut scheduler, Frameloop::Demand);

    assert!(scheduler.is_running());
    assert_eq!(requester.calls.get(), 1);
    assert_eq!(scheduler.root(key).unwrap().frames(), 1);
    assert_eq!(scheduler.root_count(), 1);
}

#[test]
fn test_unknown_root_is_an_error() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, _) = mount(&mut scheduler, Frameloop::Demand);
    scheduler.unmount_root(key).unwrap();

    assert!(matches!(scheduler.root(key), Err(Error::UnknownRoot)));
    assert!(matches!(scheduler.unmount_root(key), Err(Error::UnknownRoot)));
    assert_eq!(scheduler.root_count(), 0);
}

#[test]
fn test_unmount_queues_scene_for_release() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, _) = mount(&mut scheduler, Frameloop::Demand);
    let root = scheduler.root_mut(key).unwrap();
    let mesh = root.create_instance("mesh", Props::new()).unwrap();
    let geometry = root.create_instance("boxGeometry", Props::new()).unwrap();
    root.append_child(mesh, geometry).unwrap();
    let scene = root.scene();
    root.append_child(scene, mesh).unwrap();

    scheduler.unmount_root(key).unwrap();

    assert_eq!(scheduler.handle().pending_tasks(), 1);
    assert_eq!(scheduler.run_idle_tasks(), 2);
    assert_eq!(scheduler.handle().pending_tasks(), 0);
}

#[test]
fn test_invalidate_all() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (first, _) = mount(&mut scheduler, Frameloop::Demand);
    let (second, _) = mount(&mut scheduler, Frameloop::Demand);

    scheduler.invalidate_all(3);

    assert_eq!(scheduler.root(first).unwrap().frames(), 3);
    assert_eq!(scheduler.root(second).unwrap().frames(), 3);
}

// ============================================================================
// FRAME LOOP
// ============================================================================

#[test]
fn test_repeated_invalidation_runs_one_frame() {
    let (mut scheduler, requester) = scheduler_with_requester();
    let (key, renderer) = mount(&mut scheduler, Frameloop::Demand);
    assert!(!scheduler.frame(0.0).unwrap());
    assert!(!scheduler.is_running());
    assert_eq!(renderer.frame_count(), 1);

    let root = scheduler.root_mut(key).unwrap();
    root.invalidate(1);
    root.invalidate(1);
    assert_eq!(root.frames(), 1);
    assert_eq!(requester.calls.get(), 2);

    assert!(!scheduler.frame(16.0).unwrap());
    assert!(!scheduler.frame(32.0).unwrap());
    assert_eq!(renderer.frame_count(), 2);
}

#[test]
fn test_invalidation_is_capped() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, _) = mount(&mut scheduler, Frameloop::Demand);
    let root = scheduler.root_mut(key).unwrap();

    root.invalidate(500);

    assert_eq!(root.frames(), crate::root::FRAME_CAP);
}

#[test]
fn test_multi_frame_invalidation_repeats() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, renderer) = mount(&mut scheduler, Frameloop::Demand);
    scheduler.root_mut(key).unwrap().invalidate(3);

    assert!(scheduler.frame(0.0).unwrap());
    assert!(scheduler.frame(1.0).unwrap());
    assert!(!scheduler.frame(2.0).unwrap());
    assert_eq!(renderer.frame_count(), 3);
}

#[test]
fn test_always_root_keeps_loop_running() {
    let (mut scheduler, requester) = scheduler_with_requester();
    let (_, renderer) = mount(&mut scheduler, Frameloop::Always);

    assert!(scheduler.frame(0.0).unwrap());
    assert!(scheduler.frame(16.0).unwrap());

    assert!(scheduler.is_running());
    assert_eq!(renderer.frame_count(), 2);
    assert_eq!(requester.calls.get(), 3);
}

#[test]
fn test_never_root_renders_only_on_advance() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, renderer) = mount(&mut scheduler, Frameloop::Never);
    assert_eq!(scheduler.root(key).unwrap().frames(), 0);

    scheduler.frame(0.0).unwrap();
    assert_eq!(renderer.frame_count(), 0);

    scheduler.advance(2.5, false, Some(key)).unwrap();
    assert_eq!(renderer.frame_count(), 1);
    assert_eq!(scheduler.root(key).unwrap().clock().elapsed_time(), 2.5);
}

#[test]
fn test_advance_every_root() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (_, first) = mount(&mut scheduler, Frameloop::Never);
    let (_, second) = mount(&mut scheduler, Frameloop::Demand);

    scheduler.advance(1.0, true, None).unwrap();

    assert_eq!(first.frame_count(), 1);
    assert_eq!(second.frame_count(), 1);
}

#[test]
fn test_inactive_root_is_skipped() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, renderer) = mount(&mut scheduler, Frameloop::Always);
    scheduler.root_mut(key).unwrap().unmount().unwrap();

    assert!(!scheduler.frame(0.0).unwrap());
    assert_eq!(renderer.frame_count(), 0);
}

#[test]
fn test_render_failure_stops_loop() {
    let (mut scheduler, _) = scheduler_with_requester();
    scheduler.create_root(config(Frameloop::Always), Box::new(FailingRenderer)).unwrap();

    assert!(scheduler.frame(0.0).is_err());
    assert!(!scheduler.is_running());
}

#[test]
fn test_frame_drains_disposal_queue() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, _) = mount(&mut scheduler, Frameloop::Demand);
    let root = scheduler.root_mut(key).unwrap();
    let mesh = root.create_instance("mesh", Props::new()).unwrap();
    let scene = root.scene();
    root.append_child(scene, mesh).unwrap();
    root.remove_child(scene, mesh, None).unwrap();
    assert_eq!(scheduler.handle().pending_tasks(), 1);

    scheduler.frame(0.0).unwrap();

    assert_eq!(scheduler.handle().pending_tasks(), 0);
}

#[test]
fn test_advance_drains_disposal_queue_under_never() {
    let (mut scheduler, requester) = scheduler_with_requester();
    let (key, _) = mount(&mut scheduler, Frameloop::Never);
    let root = scheduler.root_mut(key).unwrap();
    let mesh = root.create_instance("mesh", Props::new()).unwrap();
    let geometry = root.create_instance("boxGeometry", Props::new()).unwrap();
    root.append_child(mesh, geometry).unwrap();
    let scene = root.scene();
    root.append_child(scene, mesh).unwrap();
    let calls = requester.calls.get();

    scheduler.root_mut(key).unwrap().remove_child(scene, mesh, None).unwrap();
    assert_eq!(scheduler.handle().pending_tasks(), 1);
    assert_eq!(requester.calls.get(), calls);

    scheduler.advance(1.0, true, Some(key)).unwrap();

    assert_eq!(scheduler.handle().pending_tasks(), 0);
}

#[test]
fn test_independent_schedulers() {
    let (mut first, _) = scheduler_with_requester();
    let (second, _) = scheduler_with_requester();

    mount(&mut first, Frameloop::Demand);

    assert!(first.is_running());
    assert!(!second.is_running());
}

// ============================================================================
// GLOBAL EFFECTS
// ============================================================================

#[test]
fn test_effect_phases() {
    let (mut scheduler, _) = scheduler_with_requester();
    mount(&mut scheduler, Frameloop::Demand);
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    for (label, phase) in [("before", 0), ("after", 1), ("tail", 2)] {
        let log = log.clone();
        let callback = Rc::new(move |timestamp: f64| log.borrow_mut().push(format!("{}@{}", label, timestamp)));
        match phase {
            0 => scheduler.add_effect(callback),
            1 => scheduler.add_after_effect(callback),
            _ => scheduler.add_tail_effect(callback),
        };
    }

    scheduler.frame(5.0).unwrap();

    assert_eq!(*log.borrow(), vec!["before@5", "after@5", "tail@5"]);
}

#[test]
fn test_tail_effect_waits_for_idle() {
    let (mut scheduler, _) = scheduler_with_requester();
    let (key, _) = mount(&mut scheduler, Frameloop::Demand);
    scheduler.root_mut(key).unwrap().invalidate(2);
    let tails = Rc::new(Cell::new(0));
    let counter = tails.clone();
    scheduler.add_tail_effect(Rc::new(move |_: f64| counter.set(counter.get() + 1)));

    scheduler.frame(0.0).unwrap();
    assert_eq!(tails.get(), 0);
    scheduler.frame(1.0).unwrap();
    assert_eq!(tails.get(), 1);
}

#[test]
fn test_remove_effect() {
    let (mut scheduler, _) = scheduler_with_requester();
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let id = scheduler.add_effect(Rc::new(move |_: f64| counter.set(counter.get() + 1)));

    assert!(scheduler.remove_effect(id));
    assert!(!scheduler.remove_effect(id));
    scheduler.frame(0.0).unwrap();

    assert_eq!(runs.get(), 0);
}

#[test]
fn test_advance_can_skip_global_effects() {
    let (mut scheduler, _) = scheduler_with_requester();
    mount(&mut scheduler, Frameloop::Never);
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    scheduler.add_effect(Rc::new(move |_: f64| counter.set(counter.get() + 1)));

    scheduler.advance(0.0, false, None).unwrap();
    assert_eq!(runs.get(), 0);
    scheduler.advance(1.0, true, None).unwrap();
    assert_eq!(runs.get(), 1);
}

// ============================================================================
// DISPOSAL QUEUE
// ============================================================================

#[test]
fn test_dispose_task_swallows_failures() {
    let released = Rc::new(Cell::new(0));
    let counter = released.clone();
    let fine = NativeObject::new("Probe", NodeKind::Resource).with_dispose(Rc::new(move |_: &NativeObject| {
        counter.set(counter.get() + 1);
        Ok(())
    }));
    let task = DisposeTask::new(vec![failing_object("first"), fine]);

    assert_eq!(task.len(), 2);
    assert_eq!(task.run(), 1);
    assert_eq!(released.get(), 1);
}

#[test]
fn test_empty_task_is_not_queued() {
    let (scheduler, _) = scheduler_with_requester();
    scheduler.handle().schedule_disposal(DisposeTask::new(Vec::new()));
    assert_eq!(scheduler.handle().pending_tasks(), 0);
}

#[test]
fn test_idle_tasks_run_in_submission_order() {
    let (scheduler, _) = scheduler_with_requester();
    let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    for label in ["first", "second"] {
        let order = order.clone();
        let object = NativeObject::new("Probe", NodeKind::Resource).with_dispose(Rc::new(move |_: &NativeObject| {
            order.borrow_mut().push(label.to_string());
            Ok(())
        }));
        scheduler.handle().schedule_disposal(DisposeTask::new(vec![object]));
    }

    assert_eq!(scheduler.run_idle_tasks(), 2);
    assert_eq!(*order.borrow(), vec!["first", "second"]);
}
