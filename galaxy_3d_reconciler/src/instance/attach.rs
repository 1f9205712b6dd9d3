/// Attach / detach of non-graph children.
///
/// Field attachment stores the child object at a field path of the parent
/// and remembers what was there; array attachment pushes into an array
/// field; custom attachment runs a user function and keeps its detach half.

use crate::error::{log_and_return_error, Result};
use crate::props::{read_path, replace_path, resolve_path};
use crate::root::Root;
use crate::scene::ObjectKey;
use crate::value::Value;
use super::instance::{AttachRecord, Attachment, InstanceKey};

impl Root {
    /// Attach `child` to `parent` following the child's attachment
    ///
    /// For array attachment, `before` is the object the child is inserted
    /// in front of; it is appended when `before` is not in the array.
    pub(crate) fn attach(
        &mut self,
        parent: InstanceKey,
        child: InstanceKey,
        before: Option<ObjectKey>,
    ) -> Result<()> {
        let parent_object = self.instance(parent)?.object;
        let child_object = self.instance(child)?.object;
        let attachment = self.instance(child)?.attach.clone();

        let record = match attachment {
            Attachment::Field(path) => self
                .attach_field(parent_object, child_object, &path)
                .map_err(|error| log_and_return_error("galaxy3d::Reconciler", error))?,
            Attachment::Array(name) => self
                .attach_array(parent_object, child_object, &name, before)
                .map_err(|error| log_and_return_error("galaxy3d::Reconciler", error))?,
            Attachment::Custom(attach) => {
                AttachRecord::Custom(attach(&mut self.objects, parent_object, child_object))
            }
            Attachment::SceneNode | Attachment::Unattached => return Ok(()),
        };
        self.instance_mut(child)?.attached = Some(record);
        Ok(())
    }

    fn attach_field(&mut self, parent: ObjectKey, child: ObjectKey, path: &str) -> Result<AttachRecord> {
        // `material-0` needs an array at `material`
        if let Some((prefix, last)) = path.rsplit_once('-') {
            if last.parse::<usize>().is_ok() {
                let container = resolve_path(&self.objects, parent, prefix)?;
                let owner = self.objects.object_mut(container.owner)?;
                if !matches!(read_path(owner, &container.path), Some(Value::Array(_))) {
                    replace_path(owner, &container.path, Some(Value::Array(Vec::new())), prefix)?;
                }
            }
        }

        let target = resolve_path(&self.objects, parent, path)?;
        let owner = self.objects.object_mut(target.owner)?;
        let previous = replace_path(owner, &target.path, Some(Value::Object(child)), path)?;
        crate::engine_trace!("galaxy3d::Reconciler", "Attached object to '{}'", path);
        Ok(AttachRecord::Field {
            owner: target.owner,
            path: target.path,
            key: path.to_string(),
            previous,
        })
    }

    fn attach_array(
        &mut self,
        parent: ObjectKey,
        child: ObjectKey,
        name: &str,
        before: Option<ObjectKey>,
    ) -> Result<AttachRecord> {
        let target = resolve_path(&self.objects, parent, name)?;
        let owner = self.objects.object_mut(target.owner)?;
        let mut items = match read_path(owner, &target.path) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let position = before
            .and_then(|before| items.iter().position(|item| item.as_object() == Some(before)))
            .unwrap_or(items.len());
        items.insert(position, Value::Object(child));
        replace_path(owner, &target.path, Some(Value::Array(items)), name)?;
        Ok(AttachRecord::Array { owner: target.owner, path: target.path, key: name.to_string() })
    }

    /// Undo the child's attachment; no-op when it was never attached
    pub(crate) fn detach(&mut self, child: InstanceKey) -> Result<()> {
        let Some(record) = self.instance_mut(child)?.attached.take() else {
            return Ok(());
        };
        let child_object = self.instance(child)?.object;

        match record {
            AttachRecord::Field { owner, path, key, previous } => {
                // Owner may already be gone when a whole subtree is torn down
                if let Some(owner) = self.objects.get_mut(owner) {
                    replace_path(owner, &path, previous, &key)?;
                }
            }
            AttachRecord::Array { owner, path, key } => {
                if let Some(owner) = self.objects.get_mut(owner) {
                    if let Some(Value::Array(items)) = read_path(owner, &path) {
                        let kept: Vec<Value> = items
                            .iter()
                            .filter(|item| item.as_object() != Some(child_object))
                            .cloned()
                            .collect();
                        replace_path(owner, &path, Some(Value::Array(kept)), &key)?;
                    }
                }
            }
            AttachRecord::Custom(detach) => detach(&mut self.objects),
        }
        Ok(())
    }

    /// Object following the child in its attachment array, if any
    pub(crate) fn next_array_sibling(&self, child: InstanceKey) -> Option<ObjectKey> {
        let state = self.instances.get(child)?;
        let Some(AttachRecord::Array { owner, path, .. }) = state.attached.as_ref() else {
            return None;
        };
        let items = read_path(self.objects.get(*owner)?, path)?.as_array()?;
        let position = items.iter().position(|item| item.as_object() == Some(state.object))?;
        items.get(position + 1).and_then(Value::as_object)
    }
}

#[cfg(test)]
#[path = "attach_tests.rs"]
mod tests;
