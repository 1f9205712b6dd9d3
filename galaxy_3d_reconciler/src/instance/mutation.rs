/// Mutation API: the tree operations a host reconciler drives.
///
/// Every operation keeps three structures in step: the instance table, the
/// native scene graph and the root's interaction list. Removed subtrees are
/// handed to the scheduler for deferred release.

use crate::error::{log_and_return_error, Error, Result};
use crate::props::{diff_props, DiffOptions, PropDiff};
use crate::registry::Registry;
use crate::root::Root;
use crate::scene::{NativeObject, ObjectKey};
use crate::scheduler::DisposeTask;
use crate::value::{EqualityMode, Value};
use super::instance::{Attachment, Instance, InstanceKey, Props};

/// Tag wrapping a caller-owned object
pub const PRIMITIVE_TAG: &str = "primitive";

/// Decision taken by `Root::prepare_update`
#[derive(Debug, Clone)]
pub enum UpdatePayload {
    /// Constructor args (or a primitive's object) changed
    Reconstruct,
    /// Changes to apply in place
    Patch(PropDiff),
}

fn invalid_prop(key: &str, reason: &str) -> Error {
    Error::InvalidProp { key: key.to_string(), reason: reason.to_string() }
}

fn constructor_args(props: &Props) -> Result<Vec<Value>> {
    match props.get("args") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(invalid_prop("args", "constructor arguments must be an array")),
    }
}

fn declared_dispose(props: &Props) -> bool {
    !matches!(props.get("dispose"), Some(Value::Null))
}

impl Root {
    // ===== CREATION =====

    /// Build the native object for `tag` and wrap it in a new instance
    ///
    /// `primitive` adopts the object given by the `object` prop instead of
    /// constructing one. Initial props are applied before the instance is
    /// attached anywhere, so creation never wakes the frame loop.
    pub fn create_instance(&mut self, tag: &str, props: Props) -> Result<InstanceKey> {
        let args = constructor_args(&props)
            .map_err(|error| log_and_return_error("galaxy3d::Reconciler", error))?;

        let (object, primitive, type_name) = if tag == PRIMITIVE_TAG {
            (self.adopt_primitive(&props)?, true, PRIMITIVE_TAG.to_string())
        } else {
            let native = self
                .registry
                .construct(tag, &args)
                .map_err(|error| match error {
                    Error::UnknownType(_) => error,
                    other => log_and_return_error("galaxy3d::Reconciler", other),
                })?;
            (self.objects.insert(native), false, Registry::canonical_name(tag))
        };

        match self.init_instance(object, type_name, primitive, args, props) {
            Ok(key) => {
                crate::engine_trace!("galaxy3d::Reconciler", "Created instance of '{}'", tag);
                Ok(key)
            }
            Err(error) => {
                if !primitive {
                    self.objects.take(object);
                }
                Err(error)
            }
        }
    }

    fn adopt_primitive(&self, props: &Props) -> Result<ObjectKey> {
        let Some(Value::Object(object)) = props.get("object") else {
            return Err(log_and_return_error(
                "galaxy3d::Reconciler",
                Error::InvalidPrimitive("'primitive' requires an 'object' prop".to_string()),
            ));
        };
        let Some(native) = self.objects.get(*object) else {
            return Err(log_and_return_error(
                "galaxy3d::Reconciler",
                Error::InvalidPrimitive("'object' is not in this root's store".to_string()),
            ));
        };
        if native.instance.is_some() {
            return Err(log_and_return_error(
                "galaxy3d::Reconciler",
                Error::InvalidPrimitive("'object' is already wrapped by an instance".to_string()),
            ));
        }
        Ok(*object)
    }

    fn init_instance(
        &mut self,
        object: ObjectKey,
        type_name: String,
        primitive: bool,
        args: Vec<Value>,
        props: Props,
    ) -> Result<InstanceKey> {
        let attach = self
            .decide_attachment(&props, object)
            .map_err(|error| log_and_return_error("galaxy3d::Reconciler", error))?;
        let mut instance = Instance::new(object, type_name, attach);
        instance.primitive = primitive;
        instance.args = args;
        instance.dispose = declared_dispose(&props);

        let key = self.instances.insert(instance);
        self.objects.object_mut(object)?.instance = Some(key);

        let diff = diff_props(&props, &Props::new(), DiffOptions::default());
        if let Err(error) = self.apply_props(key, &diff.changes) {
            self.instances.remove(key);
            if let Some(native) = self.objects.get_mut(object) {
                native.instance = None;
            }
            return Err(error);
        }
        self.instance_mut(key)?.memoized_props = diff.memoized;
        Ok(key)
    }

    /// Explicit `attach*` props win; geometries and materials attach to
    /// their namesake field; other scene nodes join the graph.
    fn decide_attachment(&self, props: &Props, object: ObjectKey) -> Result<Attachment> {
        match props.get("attach") {
            None | Some(Value::Null) => {}
            Some(Value::String(path)) => return Ok(Attachment::Field(path.clone())),
            Some(Value::Attach(attach)) => return Ok(Attachment::Custom(attach.clone())),
            Some(_) => return Err(invalid_prop("attach", "expected a field path or an attach function")),
        }
        match props.get("attachArray") {
            None | Some(Value::Null) => {}
            Some(Value::String(name)) => return Ok(Attachment::Array(name.clone())),
            Some(_) => return Err(invalid_prop("attachArray", "expected a field name")),
        }
        match props.get("attachObject") {
            None | Some(Value::Null) => {}
            Some(Value::Array(pair)) => match pair.as_slice() {
                [Value::String(field), Value::String(key)] => {
                    return Ok(Attachment::Field(format!("{}-{}", field, key)))
                }
                _ => return Err(invalid_prop("attachObject", "expected [field, key]")),
            },
            Some(_) => return Err(invalid_prop("attachObject", "expected [field, key]")),
        }

        let native = self.objects.object(object)?;
        let type_name = native.type_name();
        Ok(if type_name.ends_with("Geometry") {
            Attachment::Field("geometry".to_string())
        } else if type_name.ends_with("Material") {
            Attachment::Field("material".to_string())
        } else if native.is_scene_node() {
            Attachment::SceneNode
        } else {
            Attachment::Unattached
        })
    }

    /// Bare text cannot be part of a scene
    pub fn create_text_instance(&self, text: &str) -> Result<InstanceKey> {
        Err(log_and_return_error("galaxy3d::Reconciler", Error::TextNode(text.to_string())))
    }

    // ===== PLACEMENT =====

    /// Make `child` the last child of `parent`
    pub fn append_child(&mut self, parent: InstanceKey, child: InstanceKey) -> Result<()> {
        self.place_child(parent, child, None)
    }

    /// Place `child` right before `before` under `parent`
    ///
    /// Re-inserting a child that is already in place is a reorder.
    pub fn insert_before(&mut self, parent: InstanceKey, child: InstanceKey, before: InstanceKey) -> Result<()> {
        let before_object = self.instance(before)?.object;
        self.place_child(parent, child, Some(before_object))
    }

    fn place_child(&mut self, parent: InstanceKey, child: InstanceKey, before: Option<ObjectKey>) -> Result<()> {
        if parent == child || child == self.scene {
            return Err(log_and_return_error(
                "galaxy3d::Reconciler",
                Error::InvalidOperation("instance cannot be placed under this parent".to_string()),
            ));
        }
        let parent_object = self.instance(parent)?.object;
        let (child_object, attachment, previous_parent) = {
            let state = self.instance(child)?;
            (state.object, state.attach.clone(), state.parent)
        };

        // A re-placed child leaves its previous relation first
        self.detach(child)?;
        if let Some(previous) = previous_parent.filter(|&p| p != parent) {
            if let Ok(state) = self.instance_mut(previous) {
                state.objects.retain(|&o| o != child);
            }
        }

        let parent_in_graph = self.objects.object(parent_object)?.is_scene_node();
        let in_graph = match attachment {
            Attachment::SceneNode if parent_in_graph => {
                match before {
                    Some(before) => self.objects.insert_child_before(parent_object, child_object, before)?,
                    None => self.objects.add_child(parent_object, child_object)?,
                }
                true
            }
            Attachment::Field(_) | Attachment::Array(_) | Attachment::Custom(_) => {
                self.attach(parent, child, before)?;
                false
            }
            Attachment::SceneNode | Attachment::Unattached => false,
        };

        if in_graph {
            self.instance_mut(parent)?.objects.retain(|&o| o != child);
        } else {
            if let Some(graph_parent) = self.objects.object(child_object)?.parent() {
                self.objects.remove_child(graph_parent, child_object);
            }
            let before_instance = before.and_then(|b| self.instance_of(b));
            let state = self.instance_mut(parent)?;
            if !state.objects.contains(&child) {
                let position = before_instance
                    .and_then(|b| state.objects.iter().position(|&o| o == b))
                    .unwrap_or(state.objects.len());
                state.objects.insert(position, child);
            }
        }

        self.instance_mut(child)?.parent = Some(parent);
        self.register_interactivity(child_object);
        self.run_update_hook(child)?;
        self.invalidate(1);
        Ok(())
    }

    /// Register `object` and its graph descendants that declare handlers
    pub(crate) fn register_interactivity(&mut self, object: ObjectKey) {
        let mut keys = self.objects.descendants_post_order(object);
        keys.push(object);
        for key in keys {
            let has_handlers = self
                .instance_of(key)
                .and_then(|instance| self.instances.get(instance))
                .is_some_and(|state| state.event_count() > 0);
            let is_node = self.objects.get(key).is_some_and(NativeObject::is_scene_node);
            if has_handlers && is_node && !self.internal.interaction.contains(&key) {
                self.internal.interaction.push(key);
            }
        }
    }

    fn run_update_hook(&mut self, instance: InstanceKey) -> Result<()> {
        let state = self.instance(instance)?;
        if let Some(hook) = state.on_update.clone() {
            let object = state.object;
            hook(self.objects.object_mut(object)?);
        }
        Ok(())
    }

    // ===== REMOVAL =====

    /// Take `child` out of `parent`
    ///
    /// `dispose` overrides the child's own flag (`dispose: null` turns it
    /// off). The child takes its whole subtree with it: instances are
    /// dropped and the native objects leave the store. When disposing, the
    /// objects are also queued for their dispose hook, children before
    /// parents. The flag propagates to the subtree. Primitives are never
    /// released; only their instance goes away.
    pub fn remove_child(&mut self, parent: InstanceKey, child: InstanceKey, dispose: Option<bool>) -> Result<()> {
        if child == self.scene {
            crate::engine_bail!("galaxy3d::Reconciler", "the scene root cannot be removed");
        }
        let mut released = Vec::new();
        self.remove_recursive(Some(parent), child, dispose, &mut released)?;
        self.schedule_release(released);
        self.invalidate(1);
        Ok(())
    }

    fn remove_recursive(
        &mut self,
        parent: Option<InstanceKey>,
        child: InstanceKey,
        dispose: Option<bool>,
        released: &mut Vec<NativeObject>,
    ) -> Result<()> {
        let (child_object, primitive, own_dispose, attached) = {
            let state = self.instance(child)?;
            (state.object, state.primitive, state.dispose, state.attached.is_some())
        };

        if let Some(parent) = parent {
            if let Ok(state) = self.instance_mut(parent) {
                state.objects.retain(|&o| o != child);
            }
        }
        if attached {
            self.detach(child)?;
        } else if let Some(graph_parent) = self.objects.get(child_object).and_then(NativeObject::parent) {
            self.objects.remove_child(graph_parent, child_object);
        }
        self.remove_interactivity(child_object);
        self.instance_mut(child)?.parent = None;

        let disposing = dispose.unwrap_or(own_dispose);
        let attached_children = self.instance(child)?.objects.clone();
        for grandchild in attached_children {
            self.remove_recursive(Some(child), grandchild, Some(disposing), released)?;
        }
        let graph_children = self.objects.object(child_object)?.children().to_vec();
        for node in graph_children {
            match self.instance_of(node) {
                Some(grandchild) => self.remove_recursive(Some(child), grandchild, Some(disposing), released)?,
                None if primitive => {}
                None => self.release_native(node, disposing, released),
            }
        }
        self.instances.remove(child);

        if primitive {
            if let Some(native) = self.objects.get_mut(child_object) {
                native.instance = None;
            }
        } else if let Some(object) = self.objects.take(child_object) {
            if disposing {
                released.push(object);
            }
        }
        Ok(())
    }

    /// Take a native subtree out of the store, children first
    ///
    /// Objects are queued for their dispose hook only when `disposing`.
    fn release_native(&mut self, object: ObjectKey, disposing: bool, released: &mut Vec<NativeObject>) {
        let mut keys = self.objects.descendants_post_order(object);
        keys.push(object);
        for key in keys {
            if let Some(instance) = self.instance_of(key) {
                self.instances.remove(instance);
            }
            self.remove_interactivity(key);
            if let Some(native) = self.objects.take(key) {
                if disposing {
                    released.push(native);
                }
            }
        }
    }

    fn schedule_release(&mut self, released: Vec<NativeObject>) {
        if released.is_empty() {
            return;
        }
        crate::engine_debug!(
            "galaxy3d::Reconciler",
            "Queued {} object(s) for release",
            released.len()
        );
        self.tasks.schedule_disposal(DisposeTask::new(released));
    }

    // ===== RECONSTRUCTION =====

    /// Rebuild the native object behind `instance` from `tag` and `props`
    ///
    /// The instance key stays valid and now refers to the new object. Its
    /// position under the parent, its graph children and its attached
    /// objects carry over; only the native object is replaced. The old
    /// object leaves the store and is released unless declared
    /// `dispose: null`. A primitive's object is left alone.
    pub fn switch_instance(&mut self, instance: InstanceKey, tag: &str, props: Props) -> Result<()> {
        if instance == self.scene {
            crate::engine_bail!("galaxy3d::Reconciler", "the scene root cannot be reconstructed");
        }
        let (old_object, parent, primitive, release_old) = {
            let state = self.instance(instance)?;
            (state.object, state.parent, state.primitive, state.dispose)
        };
        let anchor = match parent {
            Some(_) => self.next_sibling(instance)?,
            None => None,
        };

        let temporary = self.create_instance(tag, props)?;

        self.detach(instance)?;
        if let Some(graph_parent) = self.objects.object(old_object)?.parent() {
            self.objects.remove_child(graph_parent, old_object);
        }
        self.remove_interactivity(old_object);

        let Some(mut replacement) = self.instances.remove(temporary) else {
            return Err(Error::StaleInstance);
        };
        let new_object = replacement.object;
        {
            let state = self.instance_mut(instance)?;
            replacement.parent = state.parent;
            replacement.objects = std::mem::take(&mut state.objects);
            *state = replacement;
        }
        self.objects.object_mut(new_object)?.instance = Some(instance);
        if let Some(native) = self.objects.get_mut(old_object) {
            native.instance = None;
        }

        let graph_children = self.objects.object(old_object)?.children().to_vec();
        for node in graph_children {
            if let Some(child) = self.instance_of(node) {
                self.place_child(instance, child, None)?;
            }
        }
        let attached_children = self.instance(instance)?.objects.clone();
        for child in attached_children {
            self.place_child(instance, child, None)?;
        }
        if let Some(parent) = parent {
            self.place_child(parent, instance, anchor)?;
        }

        if !primitive {
            let mut released = Vec::new();
            self.release_native(old_object, release_old, &mut released);
            self.schedule_release(released);
        }
        crate::engine_debug!("galaxy3d::Reconciler", "Reconstructed instance as '{}'", tag);
        Ok(())
    }

    fn next_sibling(&self, instance: InstanceKey) -> Result<Option<ObjectKey>> {
        let object = self.instance(instance)?.object;
        if let Some(graph_parent) = self.objects.object(object)?.parent() {
            let siblings = self.objects.object(graph_parent)?.children();
            let position = siblings.iter().position(|&sibling| sibling == object);
            return Ok(position.and_then(|p| siblings.get(p + 1).copied()));
        }
        Ok(self.next_array_sibling(instance))
    }

    // ===== UPDATES =====

    /// Decide how new props reach `instance`; `None` when nothing changed
    ///
    /// Props dropped since the last update are reset to their defaults.
    pub fn prepare_update(&self, instance: InstanceKey, new_props: &Props) -> Result<Option<UpdatePayload>> {
        let state = self.instance(instance)?;
        if state.primitive {
            if let Some(Value::Object(object)) = new_props.get("object") {
                if *object != state.object {
                    return Ok(Some(UpdatePayload::Reconstruct));
                }
            }
        }

        let args = constructor_args(new_props)
            .map_err(|error| log_and_return_error("galaxy3d::Reconciler", error))?;
        let mode = EqualityMode::default();
        let args_changed = args.len() != state.args.len()
            || args.iter().zip(&state.args).any(|(new, old)| !new.equals(old, mode));
        if args_changed {
            return Ok(Some(UpdatePayload::Reconstruct));
        }

        let options = DiffOptions { reset_removed: true, ..Default::default() };
        let diff = diff_props(new_props, &state.memoized_props, options);
        Ok(if diff.is_empty() { None } else { Some(UpdatePayload::Patch(diff)) })
    }

    /// Carry out a prepared update
    pub fn commit_update(&mut self, instance: InstanceKey, payload: UpdatePayload, new_props: Props) -> Result<()> {
        match payload {
            UpdatePayload::Reconstruct => {
                let tag = self.instance(instance)?.type_name.clone();
                self.switch_instance(instance, &tag, new_props)
            }
            UpdatePayload::Patch(diff) => {
                self.apply_props(instance, &diff.changes)?;
                let state = self.instance_mut(instance)?;
                state.dispose = declared_dispose(&diff.memoized);
                state.memoized_props = diff.memoized;
                if state.parent.is_some() {
                    self.run_update_hook(instance)?;
                }
                Ok(())
            }
        }
    }

    /// `prepare_update` then `commit_update`; returns whether anything changed
    pub fn update_instance(&mut self, instance: InstanceKey, new_props: Props) -> Result<bool> {
        match self.prepare_update(instance, &new_props)? {
            Some(payload) => {
                self.commit_update(instance, payload, new_props)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ===== TEARDOWN =====

    /// Remove everything under the scene and stop the root
    ///
    /// The root goes inactive first, so teardown requests no frames.
    /// Children declared `dispose: null` are torn down without their dispose hook.
    pub fn unmount(&mut self) -> Result<()> {
        self.internal.active = false;
        self.internal.frames = 0;

        let scene = self.scene;
        let scene_object = self.scene_object();
        let mut children = self.scene_children(scene)?;
        children.extend(self.instance(scene)?.objects.iter().copied());

        let mut released = Vec::new();
        for child in children {
            if self.contains_instance(child) {
                self.remove_recursive(Some(scene), child, None, &mut released)?;
            }
        }
        let leftovers: Vec<ObjectKey> = self
            .objects
            .object(scene_object)?
            .children()
            .iter()
            .copied()
            .filter(|&node| self.instance_of(node).is_none())
            .collect();
        for node in leftovers {
            self.release_native(node, true, &mut released);
        }
        self.schedule_release(released);

        self.internal.subscribers.clear();
        self.internal.priority = 0;
        self.internal.interaction.clear();
        self.internal.hovered.clear();
        self.internal.captured = None;
        self.internal.initial_hits.clear();
        crate::engine_info!("galaxy3d::Root", "Root unmounted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
