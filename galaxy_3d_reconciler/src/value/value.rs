/// The dynamic payload of declared props and native fields.
///
/// Scalars and math types are held by value. Native objects are referenced
/// by key, and callable payloads (event handlers, update hooks, custom
/// attach functions) are shared `Rc` closures compared by pointer.

use std::fmt;
use std::rc::Rc;
use bitflags::bitflags;
use glam::{Quat, Vec2, Vec3, Vec4};
use indexmap::IndexMap;
use crate::events::EventHandler;
use crate::instance::{AttachFn, UpdateHook};
use crate::scene::ObjectKey;
use super::color::{color_from_hex, parse_color};

/// Ordered string-keyed map value (e.g. shader uniforms)
pub type Map = IndexMap<String, Value>;

/// Dynamic value
#[derive(Clone)]
pub enum Value {
    /// Explicit empty value
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// Euler angles in radians, XYZ order
    Euler(Vec3),
    Quat(Quat),
    /// RGB components in 0..1
    Color(Vec3),
    Array(Vec<Value>),
    /// Shared map, compared by reference unless shallow equality is requested
    Map(Rc<Map>),
    /// Reference to a native object in the owning root's store
    Object(ObjectKey),
    /// Pointer event handler
    Handler(EventHandler),
    /// Post-update hook (`onUpdate`)
    Hook(UpdateHook),
    /// Custom attach function
    Attach(AttachFn),
    /// Sentinel: reset the target to its type's default
    UseDefault,
}

/// Coarse category of a [`Value`], used for same-kind checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    Null,
    Bool,
    Number,
    String,
    Vec2,
    Vec3,
    Vec4,
    Euler,
    Quat,
    Color,
    Array,
    Map,
    Object,
    Function,
    Default,
}

bitflags! {
    /// In-place mutation capabilities of a field value
    ///
    /// An empty set means the field is a plain field and is overwritten by
    /// reference.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Can copy component-wise from a value of the same category
        const COPY_MERGEABLE  = 1 << 0;
        /// Can be set positionally from a list of numbers
        const VECTOR_SETTABLE = 1 << 1;
        /// Can broadcast a single number to every component
        const SCALAR_SETTABLE = 1 << 2;
        /// Color semantics: numbers are hex codes, strings are CSS-like names
        const COLOR           = 1 << 3;
    }
}

impl Capabilities {
    /// Capabilities of an existing field value, decided from its variant
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Vec2(_) | Value::Vec3(_) | Value::Vec4(_) | Value::Euler(_) => {
                Self::COPY_MERGEABLE | Self::VECTOR_SETTABLE | Self::SCALAR_SETTABLE
            }
            Value::Quat(_) => Self::COPY_MERGEABLE | Self::VECTOR_SETTABLE,
            Value::Color(_) => Self::COPY_MERGEABLE | Self::VECTOR_SETTABLE | Self::COLOR,
            _ => Self::empty(),
        }
    }

    /// True when the target is overwritten rather than mutated
    pub fn is_plain_field(&self) -> bool {
        self.is_empty()
    }
}

/// How arrays are compared when diffing props
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayEquality {
    /// Element-wise comparison
    Shallow,
    /// Identity only; owned arrays never compare equal
    Reference,
}

/// How maps are compared when diffing props
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectEquality {
    /// Same `Rc` allocation
    Reference,
    /// Same keys, element-wise values
    Shallow,
}

/// Equality rule used by the prop differ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqualityMode {
    pub arrays: ArrayEquality,
    pub objects: ObjectEquality,
}

impl Default for EqualityMode {
    fn default() -> Self {
        Self { arrays: ArrayEquality::Shallow, objects: ObjectEquality::Reference }
    }
}

impl EqualityMode {
    /// Shallow comparison for both arrays and maps
    pub fn shallow() -> Self {
        Self { arrays: ArrayEquality::Shallow, objects: ObjectEquality::Shallow }
    }
}

impl Value {
    /// Category of this value
    pub fn category(&self) -> ValueCategory {
        match self {
            Value::Null => ValueCategory::Null,
            Value::Bool(_) => ValueCategory::Bool,
            Value::Number(_) => ValueCategory::Number,
            Value::String(_) => ValueCategory::String,
            Value::Vec2(_) => ValueCategory::Vec2,
            Value::Vec3(_) => ValueCategory::Vec3,
            Value::Vec4(_) => ValueCategory::Vec4,
            Value::Euler(_) => ValueCategory::Euler,
            Value::Quat(_) => ValueCategory::Quat,
            Value::Color(_) => ValueCategory::Color,
            Value::Array(_) => ValueCategory::Array,
            Value::Map(_) => ValueCategory::Map,
            Value::Object(_) => ValueCategory::Object,
            Value::Handler(_) | Value::Hook(_) | Value::Attach(_) => ValueCategory::Function,
            Value::UseDefault => ValueCategory::Default,
        }
    }

    /// Compare under the given equality rule
    pub fn equals(&self, other: &Value, mode: EqualityMode) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => match mode.arrays {
                ArrayEquality::Shallow => {
                    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_element(y))
                }
                ArrayEquality::Reference => false,
            },
            (Value::Map(a), Value::Map(b)) => match mode.objects {
                ObjectEquality::Reference => Rc::ptr_eq(a, b),
                ObjectEquality::Shallow => {
                    Rc::ptr_eq(a, b)
                        || (a.len() == b.len()
                            && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.same_element(w))))
                }
            },
            _ => self.same_element(other),
        }
    }

    /// Element-level comparison: scalars and math values by value,
    /// containers and callables by identity.
    fn same_element(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::UseDefault, Value::UseDefault) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vec2(a), Value::Vec2(b)) => a == b,
            (Value::Vec3(a), Value::Vec3(b)) => a == b,
            (Value::Vec4(a), Value::Vec4(b)) => a == b,
            (Value::Euler(a), Value::Euler(b)) => a == b,
            (Value::Quat(a), Value::Quat(b)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_element(y))
            }
            (Value::Handler(a), Value::Handler(b)) => Rc::ptr_eq(a, b),
            (Value::Hook(a), Value::Hook(b)) => Rc::ptr_eq(a, b),
            (Value::Attach(a), Value::Attach(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    // ===== ACCESSORS =====

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        self.as_number().map(|n| n as f32)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectKey> {
        match self {
            Value::Object(key) => Some(*key),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Value::Vec3(v) | Value::Euler(v) | Value::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Numbers of an array value, if every element is a number
    pub fn as_number_list(&self) -> Option<Vec<f32>> {
        self.as_array()?.iter().map(Value::as_f32).collect()
    }

    // ===== COMPONENT ACCESS =====

    /// Components of a math value
    pub fn components(&self) -> Option<Vec<f32>> {
        match self {
            Value::Vec2(v) => Some(v.to_array().to_vec()),
            Value::Vec3(v) | Value::Euler(v) | Value::Color(v) => Some(v.to_array().to_vec()),
            Value::Vec4(v) => Some(v.to_array().to_vec()),
            Value::Quat(q) => Some(q.to_array().to_vec()),
            _ => None,
        }
    }

    /// Index of a named component (`x`/`y`/`z`/`w`, or `r`/`g`/`b` for colors)
    pub fn component_index(&self, name: &str) -> Option<usize> {
        let index = match (self, name) {
            (Value::Color(_), "r") => 0,
            (Value::Color(_), "g") => 1,
            (Value::Color(_), "b") => 2,
            (Value::Color(_), _) => return None,
            (_, "x") => 0,
            (_, "y") => 1,
            (_, "z") => 2,
            (_, "w") => 3,
            _ => return None,
        };
        let len = self.components()?.len();
        (index < len).then_some(index)
    }

    /// Read one component
    pub fn component(&self, index: usize) -> Option<f32> {
        self.components()?.get(index).copied()
    }

    /// Write one component in place
    pub fn set_component(&mut self, index: usize, value: f32) -> bool {
        match self {
            Value::Vec2(v) if index < 2 => v[index] = value,
            Value::Vec3(v) | Value::Euler(v) | Value::Color(v) if index < 3 => v[index] = value,
            Value::Vec4(v) if index < 4 => v[index] = value,
            Value::Quat(q) if index < 4 => {
                let mut parts = q.to_array();
                parts[index] = value;
                *q = Quat::from_array(parts);
            }
            _ => return false,
        }
        true
    }

    /// Positional set: `components[i]` goes to component `i`; extra input is
    /// ignored, missing input leaves the component untouched.
    pub fn set_components(&mut self, components: &[f32]) -> bool {
        let Some(len) = self.components().map(|c| c.len()) else {
            return false;
        };
        for (index, value) in components.iter().take(len).enumerate() {
            self.set_component(index, *value);
        }
        true
    }

    /// Broadcast one number to every component
    pub fn set_scalar(&mut self, scalar: f32) -> bool {
        match self {
            Value::Vec2(v) => *v = Vec2::splat(scalar),
            Value::Vec3(v) | Value::Euler(v) => *v = Vec3::splat(scalar),
            Value::Vec4(v) => *v = Vec4::splat(scalar),
            _ => return false,
        }
        true
    }

    /// Generic setter for colors: hex number, CSS-like string, or another color
    pub fn set_color(&mut self, input: &Value) -> bool {
        let Value::Color(target) = self else {
            return false;
        };
        let parsed = match input {
            Value::Number(hex) => Some(color_from_hex(*hex as u32)),
            Value::String(s) => parse_color(s),
            Value::Color(c) | Value::Vec3(c) => Some(*c),
            _ => None,
        };
        match parsed {
            Some(rgb) => {
                *target = rgb;
                true
            }
            None => false,
        }
    }

    /// Default value for one component of this math value
    pub fn component_default(&self, index: usize) -> f32 {
        match self {
            Value::Color(_) => 1.0,
            Value::Quat(_) | Value::Vec4(_) if index == 3 => 1.0,
            _ => 0.0,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Vec2(v) => write!(f, "Vec2({}, {})", v.x, v.y),
            Value::Vec3(v) => write!(f, "Vec3({}, {}, {})", v.x, v.y, v.z),
            Value::Vec4(v) => write!(f, "Vec4({}, {}, {}, {})", v.x, v.y, v.z, v.w),
            Value::Euler(v) => write!(f, "Euler({}, {}, {})", v.x, v.y, v.z),
            Value::Quat(q) => write!(f, "Quat({}, {}, {}, {})", q.x, q.y, q.z, q.w),
            Value::Color(c) => write!(f, "Color({}, {}, {})", c.x, c.y, c.z),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Object(key) => write!(f, "Object({:?})", key),
            Value::Handler(_) => write!(f, "Handler(..)"),
            Value::Hook(_) => write!(f, "Hook(..)"),
            Value::Attach(_) => write!(f, "Attach(..)"),
            Value::UseDefault => write!(f, "UseDefault"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, EqualityMode::shallow())
    }
}

// ===== CONVERSIONS =====

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec2> for Value {
    fn from(value: Vec2) -> Self {
        Value::Vec2(value)
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Value::Vec3(value)
    }
}

impl From<Vec4> for Value {
    fn from(value: Vec4) -> Self {
        Value::Vec4(value)
    }
}

impl From<Quat> for Value {
    fn from(value: Quat) -> Self {
        Value::Quat(value)
    }
}

impl From<ObjectKey> for Value {
    fn from(value: ObjectKey) -> Self {
        Value::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(Rc::new(value))
    }
}

impl<const N: usize> From<[f32; N]> for Value {
    fn from(value: [f32; N]) -> Self {
        Value::Array(value.iter().map(|n| Value::from(*n)).collect())
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
