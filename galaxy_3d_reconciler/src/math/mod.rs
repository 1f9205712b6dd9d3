//! Minimal geometry helpers for picking
//!
//! Only what ray casting needs: bounding volumes, rays, and their
//! intersection tests. Matrices and vectors come from glam.

mod aabb;
mod ray;

pub use aabb::AABB;
pub use ray::Ray;
