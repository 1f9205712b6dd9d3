/// Pointer event types.
///
/// `EventName` is what the host surface reports; `HandlerKind` is what an
/// instance declares through `on*` props. A synthetic [`PointerEvent`] is
/// built per hit and per dispatch and never outlives it.

use std::cmp::Ordering;
use std::rc::Rc;
use bitflags::bitflags;
use glam::{Vec2, Vec3};
use crate::math::Ray;
use crate::scene::ObjectKey;

/// Surface-level input event fed to `Root::handle_pointer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Click,
    ContextMenu,
    DoubleClick,
    Wheel,
    PointerDown,
    PointerUp,
    PointerMove,
    /// Pointer left the surface
    PointerLeave,
    PointerCancel,
    LostPointerCapture,
}

impl EventName {
    /// Click family: delivery gated by the pointerdown hit set
    pub fn is_click(&self) -> bool {
        matches!(self, EventName::Click | EventName::ContextMenu | EventName::DoubleClick)
    }

    /// Handler invoked on struck objects for this event
    pub fn handler_kind(&self) -> Option<HandlerKind> {
        match self {
            EventName::Click => Some(HandlerKind::Click),
            EventName::ContextMenu => Some(HandlerKind::ContextMenu),
            EventName::DoubleClick => Some(HandlerKind::DoubleClick),
            EventName::Wheel => Some(HandlerKind::Wheel),
            EventName::PointerDown => Some(HandlerKind::PointerDown),
            EventName::PointerUp => Some(HandlerKind::PointerUp),
            EventName::PointerMove => Some(HandlerKind::PointerMove),
            EventName::PointerLeave | EventName::PointerCancel | EventName::LostPointerCapture => None,
        }
    }
}

/// Handler an instance can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Click,
    ContextMenu,
    DoubleClick,
    Wheel,
    PointerDown,
    PointerUp,
    PointerOver,
    PointerOut,
    PointerEnter,
    PointerLeave,
    PointerMove,
    PointerMissed,
}

bitflags! {
    /// Set of declared handler kinds
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HandlerMask: u16 {
        const CLICK          = 1 << 0;
        const CONTEXT_MENU   = 1 << 1;
        const DOUBLE_CLICK   = 1 << 2;
        const WHEEL          = 1 << 3;
        const POINTER_DOWN   = 1 << 4;
        const POINTER_UP     = 1 << 5;
        const POINTER_OVER   = 1 << 6;
        const POINTER_OUT    = 1 << 7;
        const POINTER_ENTER  = 1 << 8;
        const POINTER_LEAVE  = 1 << 9;
        const POINTER_MOVE   = 1 << 10;
        const POINTER_MISSED = 1 << 11;

        /// Handlers that take part in hover bookkeeping
        const HOVER = Self::POINTER_OVER.bits()
            | Self::POINTER_OUT.bits()
            | Self::POINTER_ENTER.bits()
            | Self::POINTER_LEAVE.bits();
        /// Handlers interested in pointer moves
        const MOVE_FAMILY = Self::HOVER.bits() | Self::POINTER_MOVE.bits();
    }
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 12] = [
        HandlerKind::Click,
        HandlerKind::ContextMenu,
        HandlerKind::DoubleClick,
        HandlerKind::Wheel,
        HandlerKind::PointerDown,
        HandlerKind::PointerUp,
        HandlerKind::PointerOver,
        HandlerKind::PointerOut,
        HandlerKind::PointerEnter,
        HandlerKind::PointerLeave,
        HandlerKind::PointerMove,
        HandlerKind::PointerMissed,
    ];

    /// Declared prop name, e.g. `onPointerOver`
    pub fn prop_name(&self) -> &'static str {
        match self {
            HandlerKind::Click => "onClick",
            HandlerKind::ContextMenu => "onContextMenu",
            HandlerKind::DoubleClick => "onDoubleClick",
            HandlerKind::Wheel => "onWheel",
            HandlerKind::PointerDown => "onPointerDown",
            HandlerKind::PointerUp => "onPointerUp",
            HandlerKind::PointerOver => "onPointerOver",
            HandlerKind::PointerOut => "onPointerOut",
            HandlerKind::PointerEnter => "onPointerEnter",
            HandlerKind::PointerLeave => "onPointerLeave",
            HandlerKind::PointerMove => "onPointerMove",
            HandlerKind::PointerMissed => "onPointerMissed",
        }
    }

    pub fn from_prop_name(name: &str) -> Option<HandlerKind> {
        Self::ALL.iter().copied().find(|kind| kind.prop_name() == name)
    }

    pub fn mask(&self) -> HandlerMask {
        match self {
            HandlerKind::Click => HandlerMask::CLICK,
            HandlerKind::ContextMenu => HandlerMask::CONTEXT_MENU,
            HandlerKind::DoubleClick => HandlerMask::DOUBLE_CLICK,
            HandlerKind::Wheel => HandlerMask::WHEEL,
            HandlerKind::PointerDown => HandlerMask::POINTER_DOWN,
            HandlerKind::PointerUp => HandlerMask::POINTER_UP,
            HandlerKind::PointerOver => HandlerMask::POINTER_OVER,
            HandlerKind::PointerOut => HandlerMask::POINTER_OUT,
            HandlerKind::PointerEnter => HandlerMask::POINTER_ENTER,
            HandlerKind::PointerLeave => HandlerMask::POINTER_LEAVE,
            HandlerKind::PointerMove => HandlerMask::POINTER_MOVE,
            HandlerKind::PointerMissed => HandlerMask::POINTER_MISSED,
        }
    }
}

/// Declared event callback
pub type EventHandler = Rc<dyn Fn(&mut PointerEvent)>;

/// Root-level callback for clicks that struck nothing
pub type MissedCallback = Rc<dyn Fn(&NativePointerEvent)>;

/// Reorders intersections before bubbling
pub type IntersectionOrder = Rc<dyn Fn(&Intersection, &Intersection) -> Ordering>;

/// Platform pointer input, in surface-local pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativePointerEvent {
    /// Position relative to the surface's top-left corner
    pub offset: Vec2,
    pub pointer_id: u32,
    /// 0 primary, 1 middle, 2 secondary
    pub button: u16,
    /// Scroll amount for wheel events
    pub wheel_delta: Vec2,
}

impl NativePointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self { offset: Vec2::new(x, y), ..Default::default() }
    }
}

/// One ray hit
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// World-space distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Object the ray struck
    pub object: ObjectKey,
    /// Handler-bearing object receiving the event (the struck object or an ancestor)
    pub event_object: ObjectKey,
    /// Instance slot for instanced meshes
    pub index: Option<u32>,
}

/// Hover / capture identity of a hit
pub type HitKey = (ObjectKey, Option<u32>);

impl Intersection {
    /// Key of the delivered hit: `(event object, index)`
    pub fn hit_key(&self) -> HitKey {
        (self.event_object, self.index)
    }

    /// Key of the raw hit: `(struck object, index)`
    pub fn raw_key(&self) -> HitKey {
        (self.object, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CaptureRequest {
    Set,
    Release,
}

/// Synthetic pointer event handed to declared handlers
#[derive(Debug, Clone)]
pub struct PointerEvent {
    /// Handler being invoked
    pub kind: HandlerKind,
    pub native: NativePointerEvent,
    /// Hit addressed by this event; `None` for missed notifications
    pub intersection: Option<Intersection>,
    /// Every hit of this dispatch, in delivery order
    pub intersections: Rc<[Intersection]>,
    /// Pointer in normalized device coordinates
    pub pointer: Vec2,
    /// Pointer on the camera's near plane, in world space
    pub unprojected_point: Vec3,
    pub ray: Ray,
    pub camera: ObjectKey,
    /// Pixel distance from the initiating pointerdown (click family only)
    pub delta: f32,
    stopped: bool,
    stoppable: bool,
    pub(crate) capture: Option<CaptureRequest>,
    pub(crate) invalidate_requested: bool,
}

impl PointerEvent {
    pub(crate) fn new(
        kind: HandlerKind,
        native: NativePointerEvent,
        intersection: Option<Intersection>,
        intersections: Rc<[Intersection]>,
        context: &EventContext,
        stoppable: bool,
    ) -> Self {
        Self {
            kind,
            native,
            intersection,
            intersections,
            pointer: context.pointer,
            unprojected_point: context.unprojected_point,
            ray: context.ray,
            camera: context.camera,
            delta: context.delta,
            stopped: false,
            stoppable,
            capture: None,
            invalidate_requested: false,
        }
    }

    /// Object whose handler receives this event
    pub fn event_object(&self) -> Option<ObjectKey> {
        self.intersection.as_ref().map(|hit| hit.event_object)
    }

    /// Object the ray struck
    pub fn object(&self) -> Option<ObjectKey> {
        self.intersection.as_ref().map(|hit| hit.object)
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Block delivery to farther hits
    ///
    /// Ignored while a capture is active that does not include this
    /// event's object.
    pub fn stop_propagation(&mut self) {
        if self.stoppable {
            self.stopped = true;
        }
    }

    /// Pin this hit so it keeps receiving the gesture's events
    pub fn set_pointer_capture(&mut self) {
        self.capture = Some(CaptureRequest::Set);
        self.stoppable = true;
    }

    pub fn release_pointer_capture(&mut self) {
        self.capture = Some(CaptureRequest::Release);
    }

    /// Request one more frame for the owning root
    pub fn invalidate(&mut self) {
        self.invalidate_requested = true;
    }

    pub(crate) fn set_kind(&mut self, kind: HandlerKind) {
        self.kind = kind;
    }
}

/// Per-dispatch data shared by every synthetic event of that dispatch
#[derive(Debug, Clone, Copy)]
pub(crate) struct EventContext {
    pub pointer: Vec2,
    pub unprojected_point: Vec3,
    pub ray: Ray,
    pub camera: ObjectKey,
    pub delta: f32,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
