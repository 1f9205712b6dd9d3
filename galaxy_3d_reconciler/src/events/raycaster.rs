/// Picking ray setup and scene intersection.

use glam::{Mat4, Vec2, Vec3};
use crate::math::Ray;
use crate::scene::{NativeObject, NodeKind, ObjectKey, ObjectStore, Shape};
use crate::value::Value;
use super::event::Intersection;

/// Picking ray with a near/far window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Raycaster {
    pub ray: Ray,
    pub near: f32,
    pub far: f32,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self::new(0.0, f32::INFINITY)
    }
}

impl Raycaster {
    pub fn new(near: f32, far: f32) -> Self {
        Self { ray: Ray::default(), near, far }
    }

    /// Aim the ray through `ndc` (normalized device coordinates) from a camera
    ///
    /// Perspective rays start at the camera position; orthographic rays start
    /// on the near plane and follow the view direction.
    pub fn set_from_camera(&mut self, ndc: Vec2, camera_world: Mat4, camera: &NativeObject) {
        let Some(projection) = camera.projection_matrix() else {
            return;
        };
        let unproject = camera_world * projection.inverse();
        match camera.kind() {
            NodeKind::OrthographicCamera => {
                let origin = unproject.project_point3(Vec3::new(ndc.x, ndc.y, -1.0));
                let direction = camera_world.transform_vector3(Vec3::NEG_Z);
                self.ray = Ray::new(origin, direction);
            }
            _ => {
                let origin = camera_world.transform_point3(Vec3::ZERO);
                let target = unproject.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
                self.ray = Ray::new(origin, target - origin);
            }
        }
    }

    /// Intersect several objects; results sorted by distance, nearest first
    pub fn intersect_objects(
        &self,
        store: &ObjectStore,
        objects: &[ObjectKey],
        recursive: bool,
    ) -> Vec<Intersection> {
        let mut hits = Vec::new();
        for &object in objects {
            self.collect(store, object, recursive, &mut hits);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Intersect one object (and its descendants when `recursive`)
    pub fn intersect_object(
        &self,
        store: &ObjectStore,
        object: ObjectKey,
        recursive: bool,
    ) -> Vec<Intersection> {
        self.intersect_objects(store, &[object], recursive)
    }

    fn collect(&self, store: &ObjectStore, key: ObjectKey, recursive: bool, hits: &mut Vec<Intersection>) {
        let Some(object) = store.get(key) else {
            return;
        };
        match object.kind() {
            NodeKind::Mesh => {
                if let Some(shape) = geometry_shape(store, object) {
                    let world = store.world_matrix(key);
                    self.test_shape(shape, world, key, None, hits);
                }
            }
            NodeKind::InstancedMesh => {
                if let Some(shape) = geometry_shape(store, object) {
                    let world = store.world_matrix(key);
                    let count = object.number("count").unwrap_or(0.0).max(0.0) as usize;
                    let offsets = object.get("instanceOffsets").and_then(Value::as_array).unwrap_or(&[]);
                    for (index, offset) in offsets.iter().take(count).enumerate() {
                        let translation = Mat4::from_translation(offset.as_vec3().unwrap_or(Vec3::ZERO));
                        self.test_shape(shape, world * translation, key, Some(index as u32), hits);
                    }
                }
            }
            _ => {}
        }
        if recursive {
            for &child in object.children() {
                self.collect(store, child, true, hits);
            }
        }
    }

    fn test_shape(
        &self,
        shape: Shape,
        world: Mat4,
        object: ObjectKey,
        index: Option<u32>,
        hits: &mut Vec<Intersection>,
    ) {
        let determinant = world.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return;
        }
        let local_ray = self.ray.transformed(&world.inverse());
        let t = match shape {
            Shape::Box(aabb) => local_ray.intersect_aabb(&aabb),
            Shape::Sphere { radius } => local_ray.intersect_sphere(Vec3::ZERO, radius),
        };
        let Some(t) = t else {
            return;
        };
        let point = world.transform_point3(local_ray.at(t));
        let distance = (point - self.ray.origin).length();
        if distance < self.near || distance > self.far {
            return;
        }
        hits.push(Intersection { distance, point, object, event_object: object, index });
    }
}

fn geometry_shape(store: &ObjectStore, mesh: &NativeObject) -> Option<Shape> {
    let geometry = mesh.get("geometry").and_then(Value::as_object)?;
    store.get(geometry)?.shape()
}

#[cfg(test)]
#[path = "raycaster_tests.rs"]
mod tests;
