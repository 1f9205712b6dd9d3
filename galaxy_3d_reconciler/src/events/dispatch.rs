/// Pointer dispatch: raycast, bubble and deliver surface events.
///
/// One call to `Root::handle_pointer` turns a surface event into synthetic
/// [`PointerEvent`]s: the pointer is mapped to normalized device
/// coordinates, the picking ray is cast against the interaction list,
/// hits are deduplicated and bubbled to every ancestor declaring handlers,
/// and handlers run nearest first until one stops propagation.

use std::rc::Rc;
use glam::{Vec2, Vec3};
use rustc_hash::FxHashSet;
use crate::error::Result;
use crate::instance::InstanceKey;
use crate::root::{HoverRecord, Root};
use crate::scene::ObjectKey;
use super::event::{
    CaptureRequest, EventContext, EventHandler, EventName, HandlerKind, HandlerMask, HitKey,
    Intersection, NativePointerEvent, PointerEvent,
};

impl Root {
    /// Dispatch one surface pointer event
    ///
    /// Does nothing while events are disabled. `PointerLeave` and
    /// `PointerCancel` only clear hover state; `LostPointerCapture` drops
    /// the capture first.
    pub fn handle_pointer(&mut self, name: EventName, native: &NativePointerEvent) -> Result<()> {
        if !self.events.enabled {
            return Ok(());
        }
        match name {
            EventName::PointerLeave | EventName::PointerCancel => {
                self.cancel_pointer(&[], native);
                return Ok(());
            }
            EventName::LostPointerCapture => {
                if self.internal.captured.take().is_some() {
                    self.cancel_pointer(&[], native);
                }
                return Ok(());
            }
            _ => {}
        }
        let Some(kind) = name.handler_kind() else {
            return Ok(());
        };

        let offset = self.prepare_ray(native);
        let is_move = name == EventName::PointerMove;
        let is_click = name.is_click();
        let hits = self.intersect(name);
        crate::engine_trace!("galaxy3d::Events", "{:?}: {} intersection(s)", name, hits.len());
        let delta = if is_click {
            (offset - self.internal.initial_click).length().round()
        } else {
            0.0
        };

        if name == EventName::PointerDown {
            self.internal.initial_click = offset;
            self.internal.initial_hits = hits.iter().map(|hit| hit.event_object).collect();
        }

        // Missed notifications go out before any handler runs
        if is_click && hits.is_empty() && delta <= self.events.click_threshold {
            let everyone = self.internal.interaction.clone();
            self.notify_missed(native, &everyone);
            if let Some(callback) = self.on_pointer_missed.clone() {
                callback(native);
            }
        }

        if is_move {
            self.cancel_pointer(&hits, native);
        }

        let context = self.event_context(delta);
        let intersections: Rc<[Intersection]> = hits.into();
        let mut missed_sent = false;

        for (position, hit) in intersections.iter().enumerate() {
            let Some(instance) = self.interactive_instance(hit.event_object) else {
                continue;
            };
            let stoppable = match &self.internal.captured {
                None => true,
                Some(captured) => captured.iter().any(|c| c.event_object == hit.event_object),
            };
            let mut event = PointerEvent::new(
                kind,
                *native,
                Some(hit.clone()),
                intersections.clone(),
                &context,
                stoppable,
            );

            if is_move {
                self.deliver_move(instance, hit, &mut event);
            } else if let Some(handler) = self.handler_for(instance, kind) {
                let initial = self.internal.initial_hits.contains(&hit.event_object);
                if !is_click || initial {
                    if is_click && !missed_sent {
                        missed_sent = true;
                        self.notify_missed_outside_initial(native);
                    }
                    handler(&mut event);
                }
            } else if is_click && !missed_sent && self.internal.initial_hits.contains(&hit.event_object) {
                missed_sent = true;
                self.notify_missed_outside_initial(native);
            }

            if self.finish_delivery(position, hit, &intersections, &event, native) {
                break;
            }
        }

        // Releasing the button ends any capture
        if name == EventName::PointerUp && self.internal.captured.take().is_some() {
            self.cancel_pointer(&[], native);
        }
        Ok(())
    }

    /// Map the native event to NDC and aim the raycaster; returns the surface offset
    fn prepare_ray(&mut self, native: &NativePointerEvent) -> Vec2 {
        let offset = match &self.events.compute_offsets {
            Some(compute) => compute(native, self.size),
            None => native.offset,
        };
        self.pointer = if self.size.width > 0.0 && self.size.height > 0.0 {
            Vec2::new(
                offset.x / self.size.width * 2.0 - 1.0,
                -(offset.y / self.size.height) * 2.0 + 1.0,
            )
        } else {
            Vec2::ZERO
        };
        let camera_world = self.objects.world_matrix(self.camera);
        if let Some(camera) = self.objects.get(self.camera) {
            self.raycaster.set_from_camera(self.pointer, camera_world, camera);
        }
        offset
    }

    /// Raw hits deduplicated, reordered and bubbled to handler-bearing ancestors
    fn intersect(&self, name: EventName) -> Vec<Intersection> {
        let candidates: Vec<ObjectKey> = if name == EventName::PointerMove {
            self.internal
                .interaction
                .iter()
                .copied()
                .filter(|&object| {
                    self.interactive_instance(object)
                        .and_then(|instance| self.instances.get(instance))
                        .is_some_and(|state| state.handler_mask().intersects(HandlerMask::MOVE_FAMILY))
                })
                .collect()
        } else {
            self.internal.interaction.clone()
        };

        let mut seen: FxHashSet<HitKey> = FxHashSet::default();
        let mut raw: Vec<Intersection> = self
            .raycaster
            .intersect_objects(&self.objects, &candidates, true)
            .into_iter()
            .filter(|hit| seen.insert(hit.raw_key()))
            .collect();
        if let Some(order) = &self.events.order {
            raw.sort_by(|a, b| order(a, b));
        }

        let mut intersections = Vec::new();
        for hit in &raw {
            let mut current = Some(hit.object);
            while let Some(object) = current {
                if self.interactive_instance(object).is_some() {
                    intersections.push(Intersection { event_object: object, ..hit.clone() });
                }
                current = self.objects.get(object).and_then(|o| o.parent());
            }
        }

        // Captured targets keep receiving the gesture, except discrete clicks and wheels
        if !name.is_click() && name != EventName::Wheel {
            if let Some(captured) = &self.internal.captured {
                for hit in captured {
                    if !seen.contains(&hit.hit_key()) {
                        intersections.push(hit.clone());
                    }
                }
            }
        }
        intersections
    }

    fn deliver_move(&mut self, instance: InstanceKey, hit: &Intersection, event: &mut PointerEvent) {
        let hover_aware = self
            .instances
            .get(instance)
            .is_some_and(|state| state.handler_mask().intersects(HandlerMask::HOVER));
        if hover_aware {
            let key = hit.hit_key();
            match self.internal.hovered.get(&key) {
                None => {
                    self.internal.hovered.insert(key, HoverRecord { hit: hit.clone(), stopped: false });
                    self.invoke(instance, HandlerKind::PointerOver, event);
                    self.invoke(instance, HandlerKind::PointerEnter, event);
                }
                Some(record) if record.stopped => event.stop_propagation(),
                Some(_) => {}
            }
        }
        self.invoke(instance, HandlerKind::PointerMove, event);
    }

    /// Apply capture/invalidate requests; true when propagation stops here
    fn finish_delivery(
        &mut self,
        position: usize,
        hit: &Intersection,
        intersections: &[Intersection],
        event: &PointerEvent,
        native: &NativePointerEvent,
    ) -> bool {
        self.apply_requests(event, hit);
        if !event.stopped() {
            return false;
        }
        if let Some(record) = self.internal.hovered.get_mut(&hit.hit_key()) {
            record.stopped = true;
        }
        // Only a hovered object may flush the hover state of farther hits
        let hovered = self
            .internal
            .hovered
            .values()
            .any(|record| record.hit.event_object == hit.event_object);
        if hovered {
            self.cancel_pointer(&intersections[..=position], native);
        }
        true
    }

    fn apply_requests(&mut self, event: &PointerEvent, hit: &Intersection) {
        match event.capture {
            Some(CaptureRequest::Set) => {
                let captured = self.internal.captured.get_or_insert_with(Vec::new);
                captured.retain(|c| c.event_object != hit.event_object);
                captured.push(hit.clone());
                crate::engine_trace!("galaxy3d::Events", "Pointer captured ({} target(s))", captured.len());
            }
            Some(CaptureRequest::Release) => {
                if let Some(captured) = &mut self.internal.captured {
                    captured.retain(|c| c.event_object != hit.event_object);
                    if captured.is_empty() {
                        self.internal.captured = None;
                    }
                }
            }
            None => {}
        }
        if event.invalidate_requested {
            self.invalidate(1);
        }
    }

    /// Fire out/leave for hovered hits not present in `hits` (all of them when empty)
    pub(crate) fn cancel_pointer(&mut self, hits: &[Intersection], native: &NativePointerEvent) {
        let stale: Vec<HitKey> = self
            .internal
            .hovered
            .iter()
            .filter(|(_, record)| {
                !hits
                    .iter()
                    .any(|hit| hit.object == record.hit.object && hit.index == record.hit.index)
            })
            .map(|(key, _)| *key)
            .collect();
        if stale.is_empty() {
            return;
        }

        let context = self.event_context(0.0);
        let remaining: Rc<[Intersection]> = hits.to_vec().into();
        for key in stale {
            let Some(record) = self.internal.hovered.shift_remove(&key) else {
                continue;
            };
            let Some(instance) = self.interactive_instance(record.hit.event_object) else {
                continue;
            };
            let mut event = PointerEvent::new(
                HandlerKind::PointerOut,
                *native,
                Some(record.hit.clone()),
                remaining.clone(),
                &context,
                false,
            );
            self.invoke(instance, HandlerKind::PointerOut, &mut event);
            self.invoke(instance, HandlerKind::PointerLeave, &mut event);
            self.apply_requests(&event, &record.hit);
        }
    }

    fn notify_missed_outside_initial(&mut self, native: &NativePointerEvent) {
        let outside: Vec<ObjectKey> = self
            .internal
            .interaction
            .iter()
            .copied()
            .filter(|object| !self.internal.initial_hits.contains(object))
            .collect();
        self.notify_missed(native, &outside);
    }

    /// Fire `onPointerMissed` on each of `objects`
    fn notify_missed(&mut self, native: &NativePointerEvent, objects: &[ObjectKey]) {
        if objects.is_empty() {
            return;
        }
        let context = self.event_context(0.0);
        let empty: Rc<[Intersection]> = Rc::from(Vec::new());
        for &object in objects {
            let Some(instance) = self.interactive_instance(object) else {
                continue;
            };
            let Some(handler) = self.handler_for(instance, HandlerKind::PointerMissed) else {
                continue;
            };
            let mut event = PointerEvent::new(
                HandlerKind::PointerMissed,
                *native,
                None,
                empty.clone(),
                &context,
                false,
            );
            handler(&mut event);
            if event.invalidate_requested {
                self.invalidate(1);
            }
        }
    }

    fn event_context(&self, delta: f32) -> EventContext {
        let camera_world = self.objects.world_matrix(self.camera);
        let unprojected_point = self
            .objects
            .get(self.camera)
            .and_then(|camera| camera.projection_matrix())
            .map(|projection| {
                (camera_world * projection.inverse())
                    .project_point3(Vec3::new(self.pointer.x, self.pointer.y, 0.0))
            })
            .unwrap_or(Vec3::ZERO);
        EventContext {
            pointer: self.pointer,
            unprojected_point,
            ray: self.raycaster.ray,
            camera: self.camera,
            delta,
        }
    }

    /// Instance of `object` when it declares at least one handler
    fn interactive_instance(&self, object: ObjectKey) -> Option<InstanceKey> {
        let instance = self.instance_of(object)?;
        (self.instances.get(instance)?.event_count() > 0).then_some(instance)
    }

    fn handler_for(&self, instance: InstanceKey, kind: HandlerKind) -> Option<EventHandler> {
        self.instances.get(instance)?.handler(kind)
    }

    fn invoke(&self, instance: InstanceKey, kind: HandlerKind, event: &mut PointerEvent) {
        if let Some(handler) = self.handler_for(instance, kind) {
            event.set_kind(kind);
            handler(event);
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
