/// Instance descriptor wrapping one native object.
///
/// Holds the tree relations the reconciler manages (parent, attached
/// objects, attachment descriptor), the memoized props used for diffing,
/// and the declared event handlers.

use std::rc::Rc;
use rustc_hash::FxHashMap;
use slotmap::new_key_type;
use crate::events::{EventHandler, HandlerKind, HandlerMask};
use crate::props::Segment;
use crate::scene::{NativeObject, ObjectKey, ObjectStore};
use crate::value::{Map, Value};

new_key_type! {
    /// Stable handle to an instance; survives reconstruction
    pub struct InstanceKey;
}

/// Declared props, in declaration order
pub type Props = Map;

/// Hook run after an instance is attached or patched (`onUpdate` prop)
pub type UpdateHook = Rc<dyn Fn(&mut NativeObject)>;

/// Detach half of a custom attachment
pub type DetachFn = Box<dyn FnOnce(&mut ObjectStore)>;

/// Custom attach function: `(store, parent, child) -> detach`
pub type AttachFn = Rc<dyn Fn(&mut ObjectStore, ObjectKey, ObjectKey) -> DetachFn>;

/// How an instance relates to its parent
///
/// Decided once at creation from the `attach*` props, the type name and the
/// object's kind.
#[derive(Clone)]
pub enum Attachment {
    /// Scene-graph child of the parent's object
    SceneNode,
    /// `parent[path] = child`, where `path` is a dash-separated field path
    Field(String),
    /// Pushed into the array `parent[name]`
    Array(String),
    /// User-supplied attach/detach pair
    Custom(AttachFn),
    /// Non-graph object with no declared relation
    Unattached,
}

impl Attachment {
    /// Non-graph attachment (field, array or custom)
    pub fn is_attached(&self) -> bool {
        matches!(self, Attachment::Field(_) | Attachment::Array(_) | Attachment::Custom(_))
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::SceneNode => write!(f, "SceneNode"),
            Attachment::Field(path) => write!(f, "Field({:?})", path),
            Attachment::Array(name) => write!(f, "Array({:?})", name),
            Attachment::Custom(_) => write!(f, "Custom(..)"),
            Attachment::Unattached => write!(f, "Unattached"),
        }
    }
}

/// What was done on attach, kept for detach
pub(crate) enum AttachRecord {
    /// Field attach; `previous` is `None` when the slot was unset
    Field { owner: ObjectKey, path: Vec<Segment>, key: String, previous: Option<Value> },
    /// Array attach into the array at `path`
    Array { owner: ObjectKey, path: Vec<Segment>, key: String },
    Custom(DetachFn),
}

/// Reconciler-side descriptor of one native object
pub struct Instance {
    pub(crate) object: ObjectKey,
    /// Canonical type name, or `"primitive"`
    pub(crate) type_name: String,
    pub(crate) parent: Option<InstanceKey>,
    /// Non-graph children (attached objects), in append order
    pub(crate) objects: Vec<InstanceKey>,
    pub(crate) attach: Attachment,
    pub(crate) attached: Option<AttachRecord>,
    pub(crate) memoized_props: Props,
    pub(crate) args: Vec<Value>,
    pub(crate) handlers: FxHashMap<HandlerKind, EventHandler>,
    pub(crate) handler_mask: HandlerMask,
    pub(crate) primitive: bool,
    /// False when declared with `dispose: null`
    pub(crate) dispose: bool,
    pub(crate) on_update: Option<UpdateHook>,
}

impl Instance {
    pub(crate) fn new(object: ObjectKey, type_name: impl Into<String>, attach: Attachment) -> Self {
        Self {
            object,
            type_name: type_name.into(),
            parent: None,
            objects: Vec::new(),
            attach,
            attached: None,
            memoized_props: Props::new(),
            args: Vec::new(),
            handlers: FxHashMap::default(),
            handler_mask: HandlerMask::empty(),
            primitive: false,
            dispose: true,
            on_update: None,
        }
    }

    /// Backing native object
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn parent(&self) -> Option<InstanceKey> {
        self.parent
    }

    /// Attached (non-graph) children
    pub fn objects(&self) -> &[InstanceKey] {
        &self.objects
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attach
    }

    pub fn props(&self) -> &Props {
        &self.memoized_props
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    /// Number of declared handlers
    pub fn event_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn handler_mask(&self) -> HandlerMask {
        self.handler_mask
    }

    pub fn handler(&self, kind: HandlerKind) -> Option<EventHandler> {
        self.handlers.get(&kind).cloned()
    }

    pub(crate) fn set_handler(&mut self, kind: HandlerKind, handler: Option<EventHandler>) {
        match handler {
            Some(handler) => {
                self.handlers.insert(kind, handler);
                self.handler_mask.insert(kind.mask());
            }
            None => {
                self.handlers.remove(&kind);
                self.handler_mask.remove(kind.mask());
            }
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("object", &self.object)
            .field("type_name", &self.type_name)
            .field("parent", &self.parent)
            .field("objects", &self.objects)
            .field("attach", &self.attach)
            .field("event_count", &self.handlers.len())
            .field("primitive", &self.primitive)
            .finish()
    }
}
