//! Native scene model
//!
//! The mutable object graph the reconciler drives: [`NativeObject`]s living
//! in an [`ObjectStore`] arena, with scene-graph parent/child order, local
//! transforms, and picking shapes. The built-in catalogue registers the
//! stock node and resource types with a [`Registry`](crate::registry::Registry).

mod native_object;
mod object_store;
mod catalogue;

pub use native_object::{NativeObject, NodeKind, Shape, DisposeHook};
pub use object_store::{ObjectKey, ObjectStore};
pub use catalogue::register_builtins;
pub(crate) use catalogue::{orthographic_camera, perspective_camera, scene_root};
