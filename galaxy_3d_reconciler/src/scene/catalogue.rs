/// Built-in native types.
///
/// A small scene vocabulary: transform nodes, meshes, cameras, lights,
/// geometries, materials and textures. Geometries carry a picking shape and
/// a `parameters` map; resources carry a release hook.

use std::rc::Rc;
use glam::Vec3;
use crate::error::{Error, Result};
use crate::math::AABB;
use crate::registry::Registry;
use crate::value::{Map, Value};
use super::native_object::{DisposeHook, NativeObject, NodeKind, Shape};

/// Register every built-in type into `registry`
pub fn register_builtins(registry: &Registry) {
    registry.register("Object3D", |_| Ok(NativeObject::node("Object3D", NodeKind::Object)));
    registry.register("Group", |_| Ok(NativeObject::node("Group", NodeKind::Object)));
    registry.register("Scene", |_| Ok(scene_root()));
    registry.register("Mesh", mesh);
    registry.register("InstancedMesh", instanced_mesh);
    registry.register("PerspectiveCamera", perspective_camera);
    registry.register("OrthographicCamera", orthographic_camera);
    registry.register("AmbientLight", |args| light("AmbientLight", args));
    registry.register("PointLight", |args| {
        Ok(light("PointLight", args)?
            .with_field("distance", Value::from(number_arg("PointLight", args, 2, 0.0)?))
            .with_field("decay", Value::from(number_arg("PointLight", args, 3, 2.0)?)))
    });
    registry.register("DirectionalLight", |args| {
        Ok(light("DirectionalLight", args)?
            .with_field("position", Value::Vec3(Vec3::Y))
            .with_field("target", Value::Null))
    });
    registry.register("BoxGeometry", box_geometry);
    registry.register("PlaneGeometry", plane_geometry);
    registry.register("SphereGeometry", sphere_geometry);
    registry.register("MeshBasicMaterial", |args| {
        material("MeshBasicMaterial", args)
    });
    registry.register("MeshStandardMaterial", |args| {
        let base = material("MeshStandardMaterial", &[])?
            .with_field("roughness", Value::from(1.0))
            .with_field("metalness", Value::from(0.0))
            .with_field("emissive", Value::Color(Vec3::ZERO));
        with_overrides("MeshStandardMaterial", base, args)
    });
    registry.register("Texture", |_| {
        Ok(resource("Texture")
            .with_field("image", Value::Null)
            .with_field("repeat", Value::Vec2(glam::Vec2::ONE))
            .with_field("offset", Value::Vec2(glam::Vec2::ZERO))
            .with_field("needsUpdate", Value::Bool(false)))
    });
}

/// Scene root node
pub(crate) fn scene_root() -> NativeObject {
    NativeObject::node("Scene", NodeKind::Scene)
        .with_field("background", Value::Null)
}

// ===== ARGUMENT HELPERS =====

fn invalid_args(type_name: &str, reason: impl Into<String>) -> Error {
    Error::InvalidArgs { type_name: type_name.to_string(), reason: reason.into() }
}

fn number_arg(type_name: &str, args: &[Value], index: usize, default: f64) -> Result<f64> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => Ok(*n),
        Some(other) => Err(invalid_args(
            type_name,
            format!("argument {} must be a number, got {:?}", index, other.category()),
        )),
    }
}

fn object_arg(type_name: &str, args: &[Value], index: usize) -> Result<Value> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(value) if matches!(value, Value::Object(_) | Value::Array(_)) => Ok(value.clone()),
        Some(other) => Err(invalid_args(
            type_name,
            format!("argument {} must be an object, got {:?}", index, other.category()),
        )),
    }
}

fn resource(type_name: &str) -> NativeObject {
    let hook: DisposeHook = Rc::new(|object: &NativeObject| {
        crate::engine_trace!("galaxy3d::Registry", "Released {}", object.type_name());
        Ok(())
    });
    NativeObject::new(type_name, NodeKind::Resource)
        .with_field("name", Value::from(""))
        .with_dispose(hook)
}

fn parameters(entries: &[(&str, f64)]) -> Value {
    let map: Map = entries
        .iter()
        .map(|(name, value)| (name.to_string(), Value::from(*value)))
        .collect();
    Value::from(map)
}

// ===== NODES =====

fn mesh(args: &[Value]) -> Result<NativeObject> {
    Ok(NativeObject::node("Mesh", NodeKind::Mesh)
        .with_field("geometry", object_arg("Mesh", args, 0)?)
        .with_field("material", object_arg("Mesh", args, 1)?))
}

fn instanced_mesh(args: &[Value]) -> Result<NativeObject> {
    let count = number_arg("InstancedMesh", args, 2, -1.0)?;
    if count < 0.0 {
        return Err(invalid_args("InstancedMesh", "expected (geometry, material, count)"));
    }
    let offsets = vec![Value::Vec3(Vec3::ZERO); count as usize];
    Ok(NativeObject::node("InstancedMesh", NodeKind::InstancedMesh)
        .with_field("geometry", object_arg("InstancedMesh", args, 0)?)
        .with_field("material", object_arg("InstancedMesh", args, 1)?)
        .with_field("count", Value::from(count))
        .with_field("instanceOffsets", Value::Array(offsets)))
}

pub(crate) fn perspective_camera(args: &[Value]) -> Result<NativeObject> {
    let name = "PerspectiveCamera";
    Ok(NativeObject::node(name, NodeKind::PerspectiveCamera)
        .with_field("fov", Value::from(number_arg(name, args, 0, 50.0)?))
        .with_field("aspect", Value::from(number_arg(name, args, 1, 1.0)?))
        .with_field("near", Value::from(number_arg(name, args, 2, 0.1)?))
        .with_field("far", Value::from(number_arg(name, args, 3, 2000.0)?))
        .with_field("zoom", Value::from(1.0)))
}

pub(crate) fn orthographic_camera(args: &[Value]) -> Result<NativeObject> {
    let name = "OrthographicCamera";
    Ok(NativeObject::node(name, NodeKind::OrthographicCamera)
        .with_field("left", Value::from(number_arg(name, args, 0, -1.0)?))
        .with_field("right", Value::from(number_arg(name, args, 1, 1.0)?))
        .with_field("top", Value::from(number_arg(name, args, 2, 1.0)?))
        .with_field("bottom", Value::from(number_arg(name, args, 3, -1.0)?))
        .with_field("near", Value::from(number_arg(name, args, 4, 0.1)?))
        .with_field("far", Value::from(number_arg(name, args, 5, 2000.0)?))
        .with_field("zoom", Value::from(1.0)))
}

fn light(type_name: &str, args: &[Value]) -> Result<NativeObject> {
    let mut color = Value::Color(Vec3::ONE);
    if let Some(input) = args.first().filter(|v| !v.is_null()) {
        if !color.set_color(input) {
            return Err(invalid_args(type_name, "argument 0 must be a color"));
        }
    }
    Ok(NativeObject::node(type_name, NodeKind::Object)
        .with_field("color", color)
        .with_field("intensity", Value::from(number_arg(type_name, args, 1, 1.0)?)))
}

// ===== GEOMETRIES =====

fn box_geometry(args: &[Value]) -> Result<NativeObject> {
    let name = "BoxGeometry";
    let width = number_arg(name, args, 0, 1.0)?;
    let height = number_arg(name, args, 1, 1.0)?;
    let depth = number_arg(name, args, 2, 1.0)?;
    let size = Vec3::new(width as f32, height as f32, depth as f32);
    Ok(resource(name)
        .with_field("parameters", parameters(&[("width", width), ("height", height), ("depth", depth)]))
        .with_shape(Shape::Box(AABB::from_size(size))))
}

fn plane_geometry(args: &[Value]) -> Result<NativeObject> {
    let name = "PlaneGeometry";
    let width = number_arg(name, args, 0, 1.0)?;
    let height = number_arg(name, args, 1, 1.0)?;
    let size = Vec3::new(width as f32, height as f32, 0.0);
    Ok(resource(name)
        .with_field("parameters", parameters(&[("width", width), ("height", height)]))
        .with_shape(Shape::Box(AABB::from_size(size))))
}

fn sphere_geometry(args: &[Value]) -> Result<NativeObject> {
    let name = "SphereGeometry";
    let radius = number_arg(name, args, 0, 1.0)?;
    Ok(resource(name)
        .with_field("parameters", parameters(&[("radius", radius)]))
        .with_shape(Shape::Sphere { radius: radius as f32 }))
}

// ===== MATERIALS =====

fn material(type_name: &str, args: &[Value]) -> Result<NativeObject> {
    let base = resource(type_name)
        .with_field("color", Value::Color(Vec3::ONE))
        .with_field("opacity", Value::from(1.0))
        .with_field("transparent", Value::Bool(false))
        .with_field("wireframe", Value::Bool(false))
        .with_field("map", Value::Null);
    with_overrides(type_name, base, args)
}

/// Materials accept an optional parameter map as first argument
fn with_overrides(type_name: &str, mut object: NativeObject, args: &[Value]) -> Result<NativeObject> {
    match args.first() {
        None | Some(Value::Null) => Ok(object),
        Some(Value::Map(overrides)) => {
            for (key, value) in overrides.iter() {
                let applied = object
                    .get_mut(key)
                    .is_some_and(|target| matches!(target, Value::Color(_)) && target.set_color(value));
                if !applied {
                    object.set(key.clone(), value.clone());
                }
            }
            Ok(object)
        }
        Some(_) => Err(invalid_args(type_name, "argument 0 must be a parameter map")),
    }
}

#[cfg(test)]
#[path = "catalogue_tests.rs"]
mod tests;
