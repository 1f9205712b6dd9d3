/// Ray: origin plus unit direction, with picking intersection tests.

use glam::{Mat4, Vec3};
use super::AABB;

/// Half-line `origin + t * direction`, `t >= 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length direction
    pub direction: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self { origin: Vec3::ZERO, direction: Vec3::NEG_Z }
    }
}

impl Ray {
    /// Ray from origin along `direction` (normalized here)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform into another space.
    ///
    /// The direction is *not* renormalized so that parameters stay
    /// comparable between spaces; callers measure distances in world space.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Slab test. Returns the entry parameter, or the exit parameter when
    /// the origin is inside the box.
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            if direction.abs() < f32::EPSILON {
                if origin < aabb.min[axis] || origin > aabb.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (aabb.min[axis] - origin) * inv;
            let mut t1 = (aabb.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }

    /// Ray/sphere test against a sphere at `center`
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.length_squared();
        if a == 0.0 {
            return None;
        }
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = (-b - sqrt_d) / a;
        let far = (-b + sqrt_d) / a;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
