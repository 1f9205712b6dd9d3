/// Type-aware writes into native fields.
///
/// A changed key is resolved once into a [`PropTarget`]: the object that
/// owns the write and the segment path from that object's field map down to
/// the written slot. Dash-separated keys walk through object references,
/// maps, arrays and vector components.

use std::rc::Rc;
use crate::error::{log_and_return_error, Error, Result};
use crate::instance::InstanceKey;
use crate::root::Root;
use crate::scene::{NativeObject, ObjectKey, ObjectStore};
use crate::value::{Capabilities, Value};
use super::diff::PropChange;
use super::keys::PropKind;

/// One step of a resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Field of the owning object
    Field(String),
    /// Key of a map value
    Key(String),
    /// Element of an array value
    Index(usize),
    /// Component of a math value (always last)
    Component(usize),
}

/// Where a prop write lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropTarget {
    /// Object whose field map holds the first segment
    pub owner: ObjectKey,
    /// Non-empty; starts with a `Field`
    pub path: Vec<Segment>,
}

fn invalid_prop(key: &str, reason: impl Into<String>) -> Error {
    Error::InvalidProp { key: key.to_string(), reason: reason.into() }
}

/// Resolve a (possibly dash-separated) key against `object`
///
/// Object references met along the way become the new owner, so
/// `material-color` targets the `color` field of the attached material.
/// Intermediate segments must exist; the final one may be missing.
pub fn resolve_path(store: &ObjectStore, object: ObjectKey, key: &str) -> Result<PropTarget> {
    let parts: Vec<&str> = if key.contains('-') { key.split('-').collect() } else { vec![key] };
    let mut owner = object;
    let mut path: Vec<Segment> = Vec::new();
    let mut current: Option<&Value> = None;

    for (position, part) in parts.iter().enumerate() {
        let segment = match current {
            None if path.is_empty() => Segment::Field(part.to_string()),
            Some(Value::Object(next)) => {
                owner = *next;
                path.clear();
                Segment::Field(part.to_string())
            }
            Some(Value::Map(_)) => Segment::Key(part.to_string()),
            Some(Value::Array(_)) => Segment::Index(
                part.parse()
                    .map_err(|_| invalid_prop(key, format!("'{}' is not an array index", part)))?,
            ),
            Some(value) => match value.component_index(part) {
                Some(index) => Segment::Component(index),
                None => return Err(invalid_prop(key, format!("cannot resolve segment '{}'", part))),
            },
            None => return Err(invalid_prop(key, format!("cannot resolve segment '{}'", part))),
        };
        if matches!(segment, Segment::Component(_)) && position + 1 != parts.len() {
            return Err(invalid_prop(key, "vector components have no fields"));
        }
        current = match &segment {
            Segment::Field(name) => store.object(owner)?.get(name),
            Segment::Key(name) => match current {
                Some(Value::Map(map)) => map.get(name),
                _ => None,
            },
            Segment::Index(index) => match current {
                Some(Value::Array(items)) => items.get(*index),
                _ => None,
            },
            Segment::Component(_) => None,
        };
        path.push(segment);
    }
    Ok(PropTarget { owner, path })
}

/// Read the value at `path`, if present
pub fn read_path<'a>(object: &'a NativeObject, path: &[Segment]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let Segment::Field(name) = first else {
        return None;
    };
    let mut value = object.get(name)?;
    for segment in rest {
        value = match (value, segment) {
            (Value::Map(map), Segment::Key(key)) => map.get(key)?,
            (Value::Array(items), Segment::Index(index)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(value)
}

fn value_at_mut<'a>(object: &'a mut NativeObject, path: &[Segment]) -> Option<&'a mut Value> {
    let (first, rest) = path.split_first()?;
    let Segment::Field(name) = first else {
        return None;
    };
    let mut value = object.get_mut(name)?;
    for segment in rest {
        value = match (value, segment) {
            (Value::Map(map), Segment::Key(key)) => Rc::make_mut(map).get_mut(key)?,
            (Value::Array(items), Segment::Index(index)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(value)
}

/// Write `incoming` at `path`; `None` deletes the slot
///
/// Existing math values are mutated in place following their
/// capabilities: same-category copy, positional set from a number list,
/// color parsing, scalar broadcast. Anything else is overwritten.
pub fn write_path(object: &mut NativeObject, path: &[Segment], incoming: Option<Value>, key: &str) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(invalid_prop(key, "empty path"));
    };
    match last {
        Segment::Field(name) => {
            match incoming {
                None => {
                    object.remove(name);
                }
                Some(value) => match object.get_mut(name) {
                    Some(target) => return assign(target, value, key),
                    None => {
                        object.set(name.clone(), value);
                    }
                },
            }
            Ok(())
        }
        Segment::Key(name) => {
            let Some(Value::Map(map)) = value_at_mut(object, parents) else {
                return Err(invalid_prop(key, "parent is not a map"));
            };
            let map = Rc::make_mut(map);
            match incoming {
                None => {
                    map.shift_remove(name);
                }
                Some(value) => match map.get_mut(name) {
                    Some(target) => return assign(target, value, key),
                    None => {
                        map.insert(name.clone(), value);
                    }
                },
            }
            Ok(())
        }
        Segment::Index(index) => {
            let Some(Value::Array(items)) = value_at_mut(object, parents) else {
                return Err(invalid_prop(key, "parent is not an array"));
            };
            let index = *index;
            match incoming {
                Some(value) if index < items.len() => assign(&mut items[index], value, key),
                Some(value) => {
                    items.resize(index, Value::Null);
                    items.push(value);
                    Ok(())
                }
                None if index + 1 == items.len() => {
                    items.pop();
                    Ok(())
                }
                None => {
                    if let Some(slot) = items.get_mut(index) {
                        *slot = Value::Null;
                    }
                    Ok(())
                }
            }
        }
        Segment::Component(index) => {
            let Some(target) = value_at_mut(object, parents) else {
                return Err(invalid_prop(key, "missing vector"));
            };
            let component = incoming
                .as_ref()
                .and_then(Value::as_f32)
                .unwrap_or_else(|| target.component_default(*index));
            if target.set_component(*index, component) {
                Ok(())
            } else {
                Err(invalid_prop(key, "component out of range"))
            }
        }
    }
}

/// Replace the slot at `path` by reference, returning what was there
///
/// `None` deletes the slot. No in-place mutation is attempted; attachment
/// uses this so the parent field holds the child object itself.
pub(crate) fn replace_path(
    object: &mut NativeObject,
    path: &[Segment],
    incoming: Option<Value>,
    key: &str,
) -> Result<Option<Value>> {
    let Some((last, parents)) = path.split_last() else {
        return Err(invalid_prop(key, "empty path"));
    };
    match last {
        Segment::Field(name) => Ok(match incoming {
            Some(value) => object.set(name.clone(), value),
            None => object.remove(name),
        }),
        Segment::Key(name) => {
            let Some(Value::Map(map)) = value_at_mut(object, parents) else {
                return Err(invalid_prop(key, "parent is not a map"));
            };
            let map = Rc::make_mut(map);
            Ok(match incoming {
                Some(value) => map.insert(name.clone(), value),
                None => map.shift_remove(name),
            })
        }
        Segment::Index(index) => {
            let Some(Value::Array(items)) = value_at_mut(object, parents) else {
                return Err(invalid_prop(key, "parent is not an array"));
            };
            let index = *index;
            Ok(match incoming {
                Some(value) if index < items.len() => Some(std::mem::replace(&mut items[index], value)),
                Some(value) => {
                    items.resize(index, Value::Null);
                    items.push(value);
                    None
                }
                None if index + 1 == items.len() => items.pop(),
                None if index < items.len() => Some(std::mem::replace(&mut items[index], Value::Null)),
                None => None,
            })
        }
        Segment::Component(_) => Err(invalid_prop(key, "cannot attach to a vector component")),
    }
}

fn assign(target: &mut Value, incoming: Value, key: &str) -> Result<()> {
    let capabilities = Capabilities::of(target);
    if capabilities.is_plain_field() || incoming.is_null() {
        *target = incoming;
        return Ok(());
    }
    if capabilities.contains(Capabilities::COPY_MERGEABLE) && incoming.category() == target.category() {
        *target = incoming;
        return Ok(());
    }
    if capabilities.contains(Capabilities::VECTOR_SETTABLE) {
        if let Some(components) = incoming.as_number_list() {
            target.set_components(&components);
            return Ok(());
        }
    }
    if capabilities.contains(Capabilities::COLOR) {
        return if target.set_color(&incoming) {
            Ok(())
        } else {
            Err(invalid_prop(key, format!("cannot convert {:?} to a color", incoming.category())))
        };
    }
    if capabilities.contains(Capabilities::SCALAR_SETTABLE) {
        if let Some(scalar) = incoming.as_f32() {
            target.set_scalar(scalar);
            return Ok(());
        }
    }
    Err(invalid_prop(
        key,
        format!("cannot assign {:?} to {:?}", incoming.category(), target.category()),
    ))
}

impl Root {
    /// Apply changes to an instance; returns how many were applied
    ///
    /// Handler props update the instance's handler map (and its
    /// registration in the interaction list once attached). Field props are
    /// written through their resolved path. An attached instance wakes its
    /// root when something changed and no frame is pending.
    pub fn apply_props(&mut self, instance: InstanceKey, changes: &[PropChange]) -> Result<usize> {
        let object = self.instance(instance)?.object;
        let previous_events = self.instance(instance)?.event_count();
        let mut applied = 0;

        for change in changes {
            match change.kind {
                PropKind::Reserved => continue,
                PropKind::Handler(None) => {
                    crate::engine_warn!(
                        "galaxy3d::Reconciler",
                        "Ignoring unknown event handler '{}'",
                        change.key
                    );
                    continue;
                }
                PropKind::Handler(Some(kind)) => {
                    let handler = match &change.value {
                        Value::Handler(handler) => Some(handler.clone()),
                        Value::Null | Value::UseDefault => None,
                        _ => {
                            return Err(log_and_return_error(
                                "galaxy3d::Reconciler",
                                invalid_prop(&change.key, "expected an event handler"),
                            ))
                        }
                    };
                    self.instance_mut(instance)?.set_handler(kind, handler);
                }
                PropKind::UpdateHook => {
                    let hook = match &change.value {
                        Value::Hook(hook) => Some(hook.clone()),
                        Value::Null | Value::UseDefault => None,
                        _ => {
                            return Err(log_and_return_error(
                                "galaxy3d::Reconciler",
                                invalid_prop(&change.key, "expected an update hook"),
                            ))
                        }
                    };
                    self.instance_mut(instance)?.on_update = hook;
                }
                PropKind::Field => {
                    self.apply_field(object, &change.key, &change.value)
                        .map_err(|error| log_and_return_error("galaxy3d::Reconciler", error))?;
                }
            }
            applied += 1;
        }

        let (attached, event_count) = {
            let state = self.instance(instance)?;
            (state.parent.is_some(), state.event_count())
        };
        if attached && previous_events != event_count && self.objects.object(object)?.is_scene_node() {
            self.remove_interactivity(object);
            if event_count > 0 {
                self.internal.interaction.push(object);
            }
        }
        if applied > 0 && attached && self.internal.frames == 0 {
            self.invalidate(1);
        }
        Ok(applied)
    }

    fn apply_field(&mut self, object: ObjectKey, key: &str, value: &Value) -> Result<()> {
        let target = resolve_path(&self.objects, object, key)?;
        let incoming = match value {
            Value::UseDefault => self.default_for(&target),
            other => Some(other.clone()),
        };
        crate::engine_trace!("galaxy3d::Reconciler", "Set '{}' = {:?}", key, incoming);
        let owner = self.objects.object_mut(target.owner)?;
        write_path(owner, &target.path, incoming, key)
    }

    /// Default for a reset prop
    ///
    /// Taken from the cached zero-argument instance of the owner's type when
    /// the registry can build one; otherwise the slot's own default
    /// (component defaults for math values, 0 inside untyped containers).
    /// `None` deletes the slot.
    fn default_for(&self, target: &PropTarget) -> Option<Value> {
        let owner = self.objects.get(target.owner)?;
        let Some(Segment::Field(field)) = target.path.first() else {
            return None;
        };

        let type_name = owner.type_name();
        let mut value = if self.registry.contains(type_name) {
            self.registry.default_field(type_name, field).ok().flatten()
        } else {
            None
        };
        for segment in &target.path[1..] {
            value = match (value, segment) {
                (Some(Value::Map(map)), Segment::Key(key)) => map.get(key).cloned(),
                (Some(Value::Array(items)), Segment::Index(index)) => items.get(*index).cloned(),
                (Some(vector), Segment::Component(index)) => vector.component(*index).map(Value::from),
                _ => None,
            };
        }
        if value.is_some() {
            return value;
        }

        let (last, parents) = target.path.split_last()?;
        match last {
            Segment::Component(index) => {
                let vector = read_path(owner, parents)?;
                Some(Value::from(vector.component_default(*index)))
            }
            Segment::Key(_) | Segment::Index(_) => Some(Value::from(0.0)),
            Segment::Field(_) => {
                let current = read_path(owner, &target.path)?;
                let components = current.components()?;
                let mut reset = current.clone();
                let defaults: Vec<f32> = (0..components.len()).map(|i| current.component_default(i)).collect();
                reset.set_components(&defaults);
                Some(reset)
            }
        }
    }

    /// Drop `object` from the interaction list and any hover/capture state
    pub(crate) fn remove_interactivity(&mut self, object: ObjectKey) {
        self.internal.interaction.retain(|&o| o != object);
        self.internal.initial_hits.retain(|&o| o != object);
        self.internal.hovered.retain(|_, record| record.hit.event_object != object);
        if let Some(captured) = &mut self.internal.captured {
            captured.retain(|hit| hit.event_object != object);
            if captured.is_empty() {
                self.internal.captured = None;
            }
        }
    }
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;
