/// Scheduler, the shared frame loop driving every root.
///
/// Owns the roots of one process (or one test) together with the global
/// effect lists. The platform calls [`Scheduler::frame`] from its
/// per-frame callback while [`SchedulerHandle::is_running`] is set;
/// invalidating a root sets that flag and pokes the [`FrameRequester`].

use std::rc::Rc;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::root::{Root, RootConfig, SceneRenderer};
use super::handle::{FrameRequester, SchedulerHandle};

new_key_type! {
    /// Handle to a mounted root
    pub struct RootKey;
}

/// Handle returned by the `add_*_effect` methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

/// Global effect callback, given the frame timestamp
pub type EffectCallback = Rc<dyn Fn(f64)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EffectPhase {
    /// Before any root renders
    Before,
    /// After every root rendered
    After,
    /// Once, when the loop goes idle
    Tail,
}

#[derive(Clone)]
struct Effect {
    id: EffectId,
    phase: EffectPhase,
    callback: EffectCallback,
}

pub struct Scheduler {
    registry: Rc<Registry>,
    roots: SlotMap<RootKey, Root>,
    effects: Vec<Effect>,
    next_effect: u64,
    handle: SchedulerHandle,
}

impl Scheduler {
    /// Scheduler sharing `registry` between all of its roots
    pub fn new(registry: Rc<Registry>) -> Self {
        Self {
            registry,
            roots: SlotMap::with_key(),
            effects: Vec::new(),
            next_effect: 0,
            handle: SchedulerHandle::new(),
        }
    }

    /// Same as [`new`](Self::new), waking `requester` whenever a frame is needed
    pub fn with_frame_requester(registry: Rc<Registry>, requester: Rc<dyn FrameRequester>) -> Self {
        let scheduler = Self::new(registry);
        scheduler.handle.set_frame_requester(Some(requester));
        scheduler
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub fn handle(&self) -> &SchedulerHandle {
        &self.handle
    }

    /// A frame is scheduled or executing
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    // ===== ROOTS =====

    /// Mount a new root and schedule its first frame
    pub fn create_root(&mut self, config: RootConfig, renderer: Box<dyn SceneRenderer>) -> Result<RootKey> {
        let root = Root::new(self.registry.clone(), config, renderer, self.handle.clone())?;
        let key = self.roots.insert(root);
        if let Some(root) = self.roots.get_mut(key) {
            root.invalidate(1);
        }
        crate::engine_debug!("galaxy3d::Scheduler", "Root created ({} mounted)", self.roots.len());
        Ok(key)
    }

    pub fn root(&self, key: RootKey) -> Result<&Root> {
        self.roots.get(key).ok_or(Error::UnknownRoot)
    }

    pub fn root_mut(&mut self, key: RootKey) -> Result<&mut Root> {
        self.roots.get_mut(key).ok_or(Error::UnknownRoot)
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn root_keys(&self) -> Vec<RootKey> {
        self.roots.keys().collect()
    }

    /// Tear a root down; its released objects join the idle queue
    pub fn unmount_root(&mut self, key: RootKey) -> Result<()> {
        let mut root = self.roots.remove(key).ok_or_else(|| {
            crate::engine_error!("galaxy3d::Scheduler", "Cannot unmount unknown root");
            Error::UnknownRoot
        })?;
        root.unmount()?;
        crate::engine_debug!("galaxy3d::Scheduler", "Root unmounted ({} mounted)", self.roots.len());
        Ok(())
    }

    /// Invalidate every root
    pub fn invalidate_all(&mut self, frames: u32) {
        for root in self.roots.values_mut() {
            root.invalidate(frames);
        }
    }

    // ===== FRAME LOOP =====

    /// One tick of the shared loop
    ///
    /// Runs the before-effects, renders every active root that wants a
    /// frame, runs the after-effects, then drains the disposal queue.
    /// Returns true when another tick is needed; otherwise the tail
    /// effects run and the loop goes idle.
    pub fn frame(&mut self, timestamp: f64) -> Result<bool> {
        self.handle.set_running(true);
        self.run_effects(EffectPhase::Before, timestamp);

        let mut repeat = 0;
        let mut failure = None;
        for root in self.roots.values_mut() {
            if !root.wants_frame() {
                continue;
            }
            match root.render_frame(timestamp) {
                Ok(more) => repeat += more,
                Err(error) => {
                    crate::engine_error!("galaxy3d::Scheduler", "Frame failed: {}", error);
                    failure = Some(error);
                }
            }
        }

        self.run_effects(EffectPhase::After, timestamp);
        self.handle.run_idle_tasks();

        if let Some(error) = failure {
            self.handle.set_running(false);
            return Err(error);
        }

        if repeat > 0 {
            self.handle.request_next_frame();
            Ok(true)
        } else {
            self.run_effects(EffectPhase::Tail, timestamp);
            self.handle.set_running(false);
            Ok(false)
        }
    }

    /// Render manually, regardless of frameloop policy
    ///
    /// Renders `root` alone, or every root when `None`, then drains the
    /// disposal queue. Under the `Never` policy the root clock follows
    /// `timestamp`.
    pub fn advance(&mut self, timestamp: f64, run_global_effects: bool, root: Option<RootKey>) -> Result<()> {
        if run_global_effects {
            self.run_effects(EffectPhase::Before, timestamp);
        }
        match root {
            Some(key) => {
                self.root_mut(key)?.render_frame(timestamp)?;
            }
            None => {
                for root in self.roots.values_mut() {
                    root.render_frame(timestamp)?;
                }
            }
        }
        if run_global_effects {
            self.run_effects(EffectPhase::After, timestamp);
        }
        self.handle.run_idle_tasks();
        Ok(())
    }

    /// Release queued subtrees now; returns the number of objects released
    pub fn run_idle_tasks(&self) -> usize {
        self.handle.run_idle_tasks()
    }

    // ===== GLOBAL EFFECTS =====

    /// Run `callback` at the start of every tick
    pub fn add_effect(&mut self, callback: EffectCallback) -> EffectId {
        self.push_effect(EffectPhase::Before, callback)
    }

    /// Run `callback` at the end of every tick
    pub fn add_after_effect(&mut self, callback: EffectCallback) -> EffectId {
        self.push_effect(EffectPhase::After, callback)
    }

    /// Run `callback` each time the loop goes idle
    pub fn add_tail_effect(&mut self, callback: EffectCallback) -> EffectId {
        self.push_effect(EffectPhase::Tail, callback)
    }

    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|effect| effect.id != id);
        self.effects.len() != before
    }

    fn push_effect(&mut self, phase: EffectPhase, callback: EffectCallback) -> EffectId {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        self.effects.push(Effect { id, phase, callback });
        id
    }

    fn run_effects(&self, phase: EffectPhase, timestamp: f64) {
        let effects: Vec<Effect> = self.effects.iter().filter(|e| e.phase == phase).cloned().collect();
        for effect in effects {
            (effect.callback)(timestamp);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
