/// One mutable object of the native scene.
///
/// Holds a type name, a kind tag decided at construction, a field map the
/// prop engine writes into, and scene-graph links (for node kinds only).

use std::fmt;
use std::rc::Rc;
use glam::{EulerRot, Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::instance::InstanceKey;
use crate::math::AABB;
use crate::value::Value;
use super::object_store::ObjectKey;

/// Release hook run when a removed object is disposed
///
/// Errors are logged and swallowed by the disposal queue.
pub type DisposeHook = Rc<dyn Fn(&NativeObject) -> Result<()>>;

/// What an object is, decided once when it is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Plain transform node (Object3D, Group, lights); raycasts as empty
    Object,
    /// Scene root node
    Scene,
    /// Node drawing one geometry; raycasts against the geometry shape
    Mesh,
    /// Node drawing one geometry at several offsets; hits carry an index
    InstancedMesh,
    /// Perspective projection camera
    PerspectiveCamera,
    /// Orthographic projection camera
    OrthographicCamera,
    /// Non-graph resource (geometry, material, texture)
    Resource,
}

impl NodeKind {
    /// Scene-graph node (can be a scene child and be raycast)
    pub fn is_scene_node(&self) -> bool {
        !matches!(self, NodeKind::Resource)
    }

    /// Camera node
    pub fn is_camera(&self) -> bool {
        matches!(self, NodeKind::PerspectiveCamera | NodeKind::OrthographicCamera)
    }
}

/// Picking shape of a geometry, in local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box(AABB),
    Sphere { radius: f32 },
}

/// Mutable native object
pub struct NativeObject {
    type_name: String,
    kind: NodeKind,
    fields: FxHashMap<String, Value>,
    shape: Option<Shape>,
    dispose_hook: Option<DisposeHook>,
    pub(crate) parent: Option<ObjectKey>,
    pub(crate) children: Vec<ObjectKey>,
    pub(crate) instance: Option<InstanceKey>,
}

impl NativeObject {
    /// Create an object with no fields
    pub fn new(type_name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            fields: FxHashMap::default(),
            shape: None,
            dispose_hook: None,
            parent: None,
            children: Vec::new(),
            instance: None,
        }
    }

    /// Transform node with the standard transform fields
    pub fn node(type_name: impl Into<String>, kind: NodeKind) -> Self {
        Self::new(type_name, kind)
            .with_field("name", Value::from(""))
            .with_field("position", Value::Vec3(Vec3::ZERO))
            .with_field("rotation", Value::Euler(Vec3::ZERO))
            .with_field("scale", Value::Vec3(Vec3::ONE))
            .with_field("visible", Value::Bool(true))
            .with_field("renderOrder", Value::from(0.0))
    }

    // ===== BUILDERS =====

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_dispose(mut self, hook: DisposeHook) -> Self {
        self.dispose_hook = Some(hook);
        self
    }

    // ===== GETTERS =====

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_scene_node(&self) -> bool {
        self.kind.is_scene_node()
    }

    /// Has a release hook
    pub fn is_disposable(&self) -> bool {
        self.dispose_hook.is_some()
    }

    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    /// Scene-graph children in draw order
    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    /// Instance descriptor wrapping this object, if any
    pub fn instance(&self) -> Option<InstanceKey> {
        self.instance
    }

    // ===== FIELDS =====

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Delete a field, returning the previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn number(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(Value::as_f32)
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        self.get(name).and_then(Value::as_vec3)
    }

    // ===== TRANSFORMS =====

    /// Local transform from `position`, `rotation` (XYZ euler) and `scale`
    pub fn local_matrix(&self) -> Mat4 {
        let position = self.vec3("position").unwrap_or(Vec3::ZERO);
        let scale = self.vec3("scale").unwrap_or(Vec3::ONE);
        let rotation = match self.get("rotation") {
            Some(Value::Euler(e)) => Quat::from_euler(EulerRot::XYZ, e.x, e.y, e.z),
            Some(Value::Quat(q)) => *q,
            _ => Quat::IDENTITY,
        };
        Mat4::from_scale_rotation_translation(scale, rotation, position)
    }

    /// Projection matrix for camera kinds (OpenGL clip conventions)
    pub fn projection_matrix(&self) -> Option<Mat4> {
        let near = self.number("near").unwrap_or(0.1);
        let far = self.number("far").unwrap_or(2000.0);
        let zoom = self.number("zoom").unwrap_or(1.0).max(f32::EPSILON);
        match self.kind {
            NodeKind::PerspectiveCamera => {
                let fov = self.number("fov").unwrap_or(50.0).to_radians();
                let aspect = self.number("aspect").unwrap_or(1.0);
                let zoomed_fov = 2.0 * ((fov * 0.5).tan() / zoom).atan();
                Some(Mat4::perspective_rh_gl(zoomed_fov, aspect, near, far))
            }
            NodeKind::OrthographicCamera => {
                let left = self.number("left").unwrap_or(-1.0);
                let right = self.number("right").unwrap_or(1.0);
                let top = self.number("top").unwrap_or(1.0);
                let bottom = self.number("bottom").unwrap_or(-1.0);
                let dx = (right - left) / (2.0 * zoom);
                let dy = (top - bottom) / (2.0 * zoom);
                let cx = (right + left) * 0.5;
                let cy = (top + bottom) * 0.5;
                Some(Mat4::orthographic_rh_gl(cx - dx, cx + dx, cy - dy, cy + dy, near, far))
            }
            _ => None,
        }
    }

    /// Run the release hook, if any
    pub fn dispose(&self) -> Result<()> {
        match &self.dispose_hook {
            Some(hook) => hook(self),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObject")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("children", &self.children)
            .field("parent", &self.parent)
            .finish()
    }
}
