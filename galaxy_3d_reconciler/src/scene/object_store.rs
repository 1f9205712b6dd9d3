/// Arena of native objects with scene-graph links.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys. Parent/child
/// relations are stored on the objects themselves; child order is draw order.

use glam::Mat4;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use super::native_object::NativeObject;

new_key_type! {
    /// Stable key identifying a native object in its root's store
    pub struct ObjectKey;
}

/// Arena of native objects
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: SlotMap<ObjectKey, NativeObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self { objects: SlotMap::with_key() }
    }

    /// Insert an object, returning its stable key
    pub fn insert(&mut self, object: NativeObject) -> ObjectKey {
        self.objects.insert(object)
    }

    pub fn get(&self, key: ObjectKey) -> Option<&NativeObject> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut NativeObject> {
        self.objects.get_mut(key)
    }

    /// Like `get`, failing with `StaleObject`
    pub fn object(&self, key: ObjectKey) -> Result<&NativeObject> {
        self.objects.get(key).ok_or(Error::StaleObject)
    }

    /// Like `get_mut`, failing with `StaleObject`
    pub fn object_mut(&mut self, key: ObjectKey) -> Result<&mut NativeObject> {
        self.objects.get_mut(key).ok_or(Error::StaleObject)
    }

    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Take an object out of the store
    ///
    /// Scene-graph links pointing at it from its parent are removed; links
    /// from its own children are left for the caller to tear down.
    pub fn take(&mut self, key: ObjectKey) -> Option<NativeObject> {
        self.unlink(key);
        self.objects.remove(key)
    }

    // ===== SCENE GRAPH =====

    /// Append `child` to `parent`'s children
    ///
    /// A child already under some parent is moved, ending up last.
    pub fn add_child(&mut self, parent: ObjectKey, child: ObjectKey) -> Result<()> {
        self.check_link(parent, child)?;
        self.unlink(child);
        self.object_mut(parent)?.children.push(child);
        self.object_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Place `child` right before `before` in `parent`'s children
    ///
    /// When `before` is not a child of `parent` the child is appended.
    pub fn insert_child_before(
        &mut self,
        parent: ObjectKey,
        child: ObjectKey,
        before: ObjectKey,
    ) -> Result<()> {
        self.check_link(parent, child)?;
        self.unlink(child);
        let children = &mut self.object_mut(parent)?.children;
        match children.iter().position(|&k| k == before) {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.object_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent`; returns false if it was not a child
    pub fn remove_child(&mut self, parent: ObjectKey, child: ObjectKey) -> bool {
        let Some(parent_object) = self.objects.get_mut(parent) else {
            return false;
        };
        let before = parent_object.children.len();
        parent_object.children.retain(|&k| k != child);
        let removed = parent_object.children.len() != before;
        if removed {
            if let Some(child_object) = self.objects.get_mut(child) {
                child_object.parent = None;
            }
        }
        removed
    }

    /// Parent chain from the direct parent up to the graph root
    pub fn ancestors(&self, key: ObjectKey) -> Vec<ObjectKey> {
        let mut chain = Vec::new();
        let mut current = self.get(key).and_then(|o| o.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent).and_then(|o| o.parent);
        }
        chain
    }

    /// World transform: product of local matrices from the graph root down
    pub fn world_matrix(&self, key: ObjectKey) -> Mat4 {
        let mut matrix = self.get(key).map(|o| o.local_matrix()).unwrap_or(Mat4::IDENTITY);
        for ancestor in self.ancestors(key) {
            if let Some(object) = self.get(ancestor) {
                matrix = object.local_matrix() * matrix;
            }
        }
        matrix
    }

    /// All scene-graph descendants of `key`, children before parents
    ///
    /// `key` itself is not included.
    pub fn descendants_post_order(&self, key: ObjectKey) -> Vec<ObjectKey> {
        let mut out = Vec::new();
        if let Some(object) = self.get(key) {
            for &child in &object.children {
                self.collect_post_order(child, &mut out);
            }
        }
        out
    }

    fn collect_post_order(&self, key: ObjectKey, out: &mut Vec<ObjectKey>) {
        if let Some(object) = self.get(key) {
            for &child in &object.children {
                self.collect_post_order(child, out);
            }
            out.push(key);
        }
    }

    fn check_link(&self, parent: ObjectKey, child: ObjectKey) -> Result<()> {
        if parent == child {
            return Err(Error::InvalidOperation("an object cannot be its own child".to_string()));
        }
        if !self.contains(child) {
            return Err(Error::StaleObject);
        }
        if !self.object(parent)?.is_scene_node() || !self.object(child)?.is_scene_node() {
            return Err(Error::InvalidOperation(
                "scene-graph links require scene nodes on both ends".to_string(),
            ));
        }
        if self.ancestors(parent).contains(&child) {
            return Err(Error::InvalidOperation("link would create a cycle".to_string()));
        }
        Ok(())
    }

    fn unlink(&mut self, child: ObjectKey) {
        let Some(parent) = self.get(child).and_then(|o| o.parent) else {
            return;
        };
        self.remove_child(parent, child);
    }
}

#[cfg(test)]
#[path = "object_store_tests.rs"]
mod tests;
