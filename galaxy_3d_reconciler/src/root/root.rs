/// Root, the per-surface store.
///
/// Owns the native objects and instances of one surface plus its camera,
/// raycaster, clock, size and frame bookkeeping. The mutation API
/// (`instance` module), the prop engine (`props`) and event dispatch
/// (`events`) are implemented as further `impl Root` blocks.

use std::rc::Rc;
use glam::{Vec2, Vec3};
use indexmap::IndexMap;
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::events::{HitKey, Intersection, MissedCallback, Raycaster};
use crate::instance::{Attachment, Instance, InstanceKey};
use crate::registry::Registry;
use crate::scene::{self, NativeObject, ObjectKey, ObjectStore};
use crate::scheduler::SchedulerHandle;
use crate::value::Value;
use super::clock::Clock;
use super::config::{CameraConfig, EventConfig, Frameloop, Projection, RootConfig};
use super::renderer::SceneRenderer;
use super::viewport::{Size, Viewport};

/// Invalidation saturates at this many pending frames
pub const FRAME_CAP: u32 = 60;

/// Per-frame subscriber: `(root, delta seconds)`
pub type FrameCallback = Rc<dyn Fn(&mut Root, f32)>;

/// Handle returned by `Root::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
pub(crate) struct Subscription {
    pub id: SubscriptionId,
    pub priority: i32,
    pub callback: FrameCallback,
}

/// Last delivered hit for a hovered object
#[derive(Debug, Clone)]
pub(crate) struct HoverRecord {
    pub hit: Intersection,
    /// Propagation was stopped while delivering to this hit
    pub stopped: bool,
}

/// Bookkeeping not exposed as root state
#[derive(Default)]
pub(crate) struct InternalState {
    pub active: bool,
    /// Number of positive-priority subscriptions
    pub priority: usize,
    pub frames: u32,
    pub subscribers: Vec<Subscription>,
    pub next_subscription: u64,
    pub interaction: Vec<ObjectKey>,
    pub hovered: IndexMap<HitKey, HoverRecord>,
    pub captured: Option<Vec<Intersection>>,
    pub initial_click: Vec2,
    pub initial_hits: Vec<ObjectKey>,
}

/// Per-surface state
pub struct Root {
    pub(crate) registry: Rc<Registry>,
    pub(crate) objects: ObjectStore,
    pub(crate) instances: SlotMap<InstanceKey, Instance>,
    pub(crate) scene: InstanceKey,
    pub(crate) camera: ObjectKey,
    pub(crate) manual_camera: bool,
    pub(crate) raycaster: Raycaster,
    pub(crate) pointer: Vec2,
    pub(crate) clock: Clock,
    pub(crate) size: Size,
    pub(crate) viewport: Viewport,
    pub(crate) dpr_range: (f32, f32),
    pub(crate) frameloop: Frameloop,
    pub(crate) events: EventConfig,
    pub(crate) on_pointer_missed: Option<MissedCallback>,
    pub(crate) internal: InternalState,
    pub(crate) renderer: Box<dyn SceneRenderer>,
    pub(crate) tasks: SchedulerHandle,
}

impl Root {
    /// Build a root with an empty scene and the configured camera
    ///
    /// The root starts active with no pending frame.
    pub fn new(
        registry: Rc<Registry>,
        config: RootConfig,
        renderer: Box<dyn SceneRenderer>,
        tasks: SchedulerHandle,
    ) -> Result<Self> {
        let mut objects = ObjectStore::new();
        let scene_object = objects.insert(scene::scene_root());
        let camera = objects.insert(build_camera(&config.camera, config.size)?);

        let mut instances = SlotMap::with_key();
        let scene = instances.insert(Instance::new(scene_object, "Scene", Attachment::SceneNode));
        objects.object_mut(scene_object)?.instance = Some(scene);

        let dpr = config.dpr.clamp(config.dpr_range.0, config.dpr_range.1);
        let mut root = Self {
            registry,
            objects,
            instances,
            scene,
            camera,
            manual_camera: config.camera.manual,
            raycaster: Raycaster::new(config.raycaster.near, config.raycaster.far),
            pointer: Vec2::ZERO,
            clock: Clock::new(),
            size: config.size,
            viewport: Viewport {
                width: 0.0,
                height: 0.0,
                top: 0.0,
                left: 0.0,
                factor: 0.0,
                distance: 0.0,
                aspect: 1.0,
                dpr,
            },
            dpr_range: config.dpr_range,
            frameloop: config.frameloop,
            events: config.events,
            on_pointer_missed: config.on_pointer_missed,
            internal: InternalState { active: true, ..Default::default() },
            renderer,
            tasks,
        };
        root.apply_size(config.size);
        if root.frameloop == Frameloop::Never {
            root.clock.stop();
        }
        Ok(root)
    }

    // ===== ACCESSORS =====

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// Direct store access for primitives and imperative tweaks
    ///
    /// Changes made here bypass prop diffing and invalidation.
    pub fn objects_mut(&mut self) -> &mut ObjectStore {
        &mut self.objects
    }

    pub fn object(&self, key: ObjectKey) -> Result<&NativeObject> {
        self.objects.object(key)
    }

    pub fn instance(&self, key: InstanceKey) -> Result<&Instance> {
        self.instances.get(key).ok_or(Error::StaleInstance)
    }

    pub(crate) fn instance_mut(&mut self, key: InstanceKey) -> Result<&mut Instance> {
        self.instances.get_mut(key).ok_or(Error::StaleInstance)
    }

    pub fn contains_instance(&self, key: InstanceKey) -> bool {
        self.instances.contains_key(key)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Instance wrapping `object`, if any
    pub fn instance_of(&self, object: ObjectKey) -> Option<InstanceKey> {
        self.objects.get(object).and_then(|o| o.instance)
    }

    /// Native object behind an instance
    pub fn object_of(&self, instance: InstanceKey) -> Result<ObjectKey> {
        Ok(self.instance(instance)?.object)
    }

    /// Scene root instance
    pub fn scene(&self) -> InstanceKey {
        self.scene
    }

    pub fn scene_object(&self) -> ObjectKey {
        self.instances.get(self.scene).map(|i| i.object).unwrap_or_default()
    }

    /// Instances of the scene-graph children of `instance`, in draw order
    pub fn scene_children(&self, instance: InstanceKey) -> Result<Vec<InstanceKey>> {
        let object = self.objects.object(self.instance(instance)?.object)?;
        Ok(object
            .children()
            .iter()
            .filter_map(|&child| self.instance_of(child))
            .collect())
    }

    pub fn camera(&self) -> ObjectKey {
        self.camera
    }

    pub fn raycaster(&self) -> &Raycaster {
        &self.raycaster
    }

    pub fn raycaster_mut(&mut self) -> &mut Raycaster {
        &mut self.raycaster
    }

    /// Last pointer position in normalized device coordinates
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn dpr(&self) -> f32 {
        self.viewport.dpr
    }

    pub fn frameloop(&self) -> Frameloop {
        self.frameloop
    }

    pub fn events(&self) -> &EventConfig {
        &self.events
    }

    pub fn is_active(&self) -> bool {
        self.internal.active
    }

    /// Pending frames
    pub fn frames(&self) -> u32 {
        self.internal.frames
    }

    /// Objects registered for pointer events
    pub fn interaction(&self) -> &[ObjectKey] {
        &self.internal.interaction
    }

    /// Hovered hits, in hover order
    pub fn hovered(&self) -> Vec<HitKey> {
        self.internal.hovered.keys().copied().collect()
    }

    /// Hits pinned by pointer capture
    pub fn captured(&self) -> Option<&[Intersection]> {
        self.internal.captured.as_deref()
    }

    pub fn scheduler_handle(&self) -> &SchedulerHandle {
        &self.tasks
    }

    // ===== SETTERS =====

    /// Resize the surface: camera projection (unless manual), renderer and viewport
    pub fn set_size(&mut self, size: Size) {
        self.apply_size(size);
        self.invalidate(1);
    }

    fn apply_size(&mut self, size: Size) {
        self.size = size;
        if !self.manual_camera {
            if let Some(camera) = self.objects.get_mut(self.camera) {
                if camera.kind().is_camera() && camera.has("fov") {
                    camera.set("aspect", Value::from(size.aspect()));
                } else if camera.has("left") {
                    camera.set("left", Value::from(size.width / -2.0));
                    camera.set("right", Value::from(size.width / 2.0));
                    camera.set("top", Value::from(size.height / 2.0));
                    camera.set("bottom", Value::from(size.height / -2.0));
                }
            }
        }
        let dpr = self.viewport.dpr;
        self.renderer.set_size(size.width, size.height, dpr);
        self.viewport = self.viewport_at(Vec3::ZERO);
    }

    /// Device pixel ratio, clamped to the configured range
    pub fn set_dpr(&mut self, dpr: f32) {
        let clamped = dpr.clamp(self.dpr_range.0, self.dpr_range.1);
        self.viewport.dpr = clamped;
        self.renderer.set_size(self.size.width, self.size.height, clamped);
        self.invalidate(1);
    }

    /// Switch frame policy; the clock restarts unless the policy is `Never`
    pub fn set_frameloop(&mut self, frameloop: Frameloop) {
        self.clock.stop();
        if frameloop != Frameloop::Never {
            self.clock.start();
        }
        self.frameloop = frameloop;
        if frameloop != Frameloop::Never {
            self.invalidate(1);
        }
    }

    pub fn set_events(&mut self, events: EventConfig) {
        self.events = events;
    }

    pub fn set_pointer_missed(&mut self, callback: Option<MissedCallback>) {
        self.on_pointer_missed = callback;
    }

    /// Make `camera` the active camera
    pub fn set_camera(&mut self, camera: ObjectKey) -> Result<()> {
        if !self.objects.object(camera)?.kind().is_camera() {
            crate::engine_bail!("galaxy3d::Root", "set_camera expects a camera object");
        }
        self.camera = camera;
        self.apply_size(self.size);
        self.invalidate(1);
        Ok(())
    }

    /// Viewport measured at a world-space reference point
    pub fn viewport_at(&self, target: Vec3) -> Viewport {
        let dpr = self.viewport.dpr;
        match self.objects.get(self.camera) {
            Some(camera) => {
                let position = self.objects.world_matrix(self.camera).transform_point3(Vec3::ZERO);
                Viewport::compute(camera, position, target, self.size, dpr)
            }
            None => Viewport { aspect: self.size.aspect(), dpr, ..self.viewport },
        }
    }

    // ===== FRAMES =====

    /// Request `frames` more frames
    ///
    /// Saturating: the counter becomes `min(FRAME_CAP, max(frames, pending))`,
    /// so repeated requests within one tick collapse. Ignored while inactive
    /// or under the `Never` policy.
    pub fn invalidate(&mut self, frames: u32) {
        if !self.internal.active || self.frameloop == Frameloop::Never {
            return;
        }
        self.internal.frames = FRAME_CAP.min(self.internal.frames.max(frames));
        self.tasks.request_frame();
    }

    /// Run `callback` every frame
    ///
    /// Subscribers run in ascending priority, equal priorities in
    /// registration order. Any positive priority suppresses the automatic
    /// render call.
    pub fn subscribe(&mut self, callback: FrameCallback, priority: i32) -> SubscriptionId {
        let id = SubscriptionId(self.internal.next_subscription);
        self.internal.next_subscription += 1;
        if priority > 0 {
            self.internal.priority += 1;
        }
        self.internal.subscribers.push(Subscription { id, priority, callback });
        self.internal.subscribers.sort_by_key(|s| s.priority);
        id
    }

    /// Drop a subscription; returns false for unknown ids
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(index) = self.internal.subscribers.iter().position(|s| s.id == id) else {
            return false;
        };
        let removed = self.internal.subscribers.remove(index);
        if removed.priority > 0 {
            self.internal.priority -= 1;
        }
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.internal.subscribers.len()
    }

    /// Run one frame: clock, subscribers, render
    ///
    /// Returns how many more frames this root wants.
    pub(crate) fn render_frame(&mut self, timestamp: f64) -> Result<u32> {
        let delta = if self.frameloop == Frameloop::Never {
            self.clock.set_elapsed(timestamp)
        } else {
            self.clock.tick(timestamp)
        };

        let subscribers = self.internal.subscribers.clone();
        for subscription in subscribers {
            (subscription.callback)(self, delta as f32);
        }

        if self.internal.priority == 0 {
            let scene = self.scene_object();
            self.renderer.render(&self.objects, scene, self.camera)?;
        }

        self.internal.frames = self.internal.frames.saturating_sub(1);
        Ok(if self.frameloop == Frameloop::Always { 1 } else { self.internal.frames })
    }

    /// Frame eligibility for the shared loop
    pub(crate) fn wants_frame(&self) -> bool {
        self.internal.active
            && (self.frameloop == Frameloop::Always || self.internal.frames > 0)
    }
}

fn build_camera(config: &CameraConfig, size: Size) -> Result<NativeObject> {
    let mut camera = match config.projection {
        Projection::Perspective { fov } => scene::perspective_camera(&[
            Value::from(fov),
            Value::from(size.aspect()),
            Value::from(config.near),
            Value::from(config.far),
        ])?,
        Projection::Orthographic { zoom } => {
            let mut camera = scene::orthographic_camera(&[
                Value::from(size.width / -2.0),
                Value::from(size.width / 2.0),
                Value::from(size.height / 2.0),
                Value::from(size.height / -2.0),
                Value::from(config.near),
                Value::from(config.far),
            ])?;
            camera.set("zoom", Value::from(zoom));
            camera
        }
    };
    camera.set("position", Value::Vec3(config.position));
    Ok(camera)
}

#[cfg(test)]
#[path = "root_tests.rs"]
mod tests;
