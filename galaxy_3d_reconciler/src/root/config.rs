/// Root configuration descriptors.

use std::rc::Rc;
use glam::{Vec2, Vec3};
use crate::events::{IntersectionOrder, MissedCallback, NativePointerEvent};
use super::viewport::Size;

/// When frames run for a root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frameloop {
    /// Every tick
    #[default]
    Always,
    /// Only while invalidated
    Demand,
    /// Only through explicit `advance`
    Never,
}

/// Camera projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in degrees
    Perspective { fov: f32 },
    /// Pixel-sized frustum divided by `zoom`
    Orthographic { zoom: f32 },
}

/// Default camera description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub projection: Projection,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
    /// When set, resizing leaves the projection untouched
    pub manual: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective { fov: 75.0 },
            position: Vec3::new(0.0, 0.0, 5.0),
            near: 0.1,
            far: 1000.0,
            manual: false,
        }
    }
}

/// Maps a native event to surface offsets (for surfaces without DOM-like offsets)
pub type ComputeOffsets = Rc<dyn Fn(&NativePointerEvent, Size) -> Vec2>;

/// Event layer settings
#[derive(Clone)]
pub struct EventConfig {
    /// Dispatch is skipped entirely when false
    pub enabled: bool,
    /// Max pixel travel between pointerdown and click for a "missed" notification
    pub click_threshold: f32,
    pub compute_offsets: Option<ComputeOffsets>,
    /// Reorders raw intersections before bubbling
    pub order: Option<IntersectionOrder>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { enabled: true, click_threshold: 2.0, compute_offsets: None, order: None }
    }
}

/// Picking ray window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycasterConfig {
    pub near: f32,
    pub far: f32,
}

impl Default for RaycasterConfig {
    fn default() -> Self {
        Self { near: 0.0, far: f32::INFINITY }
    }
}

/// Everything needed to mount a root
#[derive(Clone)]
pub struct RootConfig {
    pub size: Size,
    pub dpr: f32,
    /// Clamp range for `set_dpr`
    pub dpr_range: (f32, f32),
    pub frameloop: Frameloop,
    pub camera: CameraConfig,
    pub events: EventConfig,
    pub raycaster: RaycasterConfig,
    pub on_pointer_missed: Option<MissedCallback>,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            size: Size::new(800.0, 600.0),
            dpr: 1.0,
            dpr_range: (1.0, 2.0),
            frameloop: Frameloop::Always,
            camera: CameraConfig::default(),
            events: EventConfig::default(),
            raycaster: RaycasterConfig::default(),
            on_pointer_missed: None,
        }
    }
}
