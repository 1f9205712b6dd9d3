/// Surface size and derived viewport.

use glam::Vec3;
use crate::scene::{NativeObject, NodeKind};

/// Surface rectangle in CSS-like pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub left: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height, top: 0.0, left: 0.0 }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// World-space dimensions of the surface at a reference distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub left: f32,
    /// Pixels per world unit
    pub factor: f32,
    /// Camera distance to the reference point
    pub distance: f32,
    pub aspect: f32,
    pub dpr: f32,
}

impl Viewport {
    /// Viewport for `camera` placed at `camera_position`, measured at `target`
    pub fn compute(camera: &NativeObject, camera_position: Vec3, target: Vec3, size: Size, dpr: f32) -> Self {
        let distance = camera_position.distance(target);
        let aspect = size.aspect();
        match camera.kind() {
            NodeKind::OrthographicCamera => {
                let zoom = camera.number("zoom").unwrap_or(1.0).max(f32::EPSILON);
                Self {
                    width: size.width / zoom,
                    height: size.height / zoom,
                    top: size.top,
                    left: size.left,
                    factor: 1.0,
                    distance,
                    aspect,
                    dpr,
                }
            }
            _ => {
                let fov = camera.number("fov").unwrap_or(75.0).to_radians();
                let height = 2.0 * (fov / 2.0).tan() * distance;
                let width = height * aspect;
                let factor = if width > 0.0 { size.width / width } else { 0.0 };
                Self { width, height, top: size.top, left: size.left, factor, distance, aspect, dpr }
            }
        }
    }
}
