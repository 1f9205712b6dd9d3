/// The drawing backend a root hands its scene to.
///
/// The reconciler never touches GPU state itself; each frame it asks the
/// renderer to draw the scene from the active camera.

use std::cell::RefCell;
use std::rc::Rc;
use crate::error::Result;
use crate::scene::{ObjectKey, ObjectStore};

/// Drawing backend
pub trait SceneRenderer {
    /// Draw `scene` as seen from `camera`
    fn render(&mut self, objects: &ObjectStore, scene: ObjectKey, camera: ObjectKey) -> Result<()>;

    /// Surface resized
    fn set_size(&mut self, _width: f32, _height: f32, _dpr: f32) {}
}

/// One recorded draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRecord {
    pub scene: ObjectKey,
    pub camera: ObjectKey,
    /// Live objects in the store at draw time
    pub object_count: usize,
}

#[derive(Debug, Default)]
struct RenderLog {
    frames: Vec<RenderRecord>,
    sizes: Vec<(f32, f32, f32)>,
}

/// Renderer that only records what it was asked to draw
///
/// Clones share the same log, so a test can keep one clone and box the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    log: Rc<RefCell<RenderLog>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.log.borrow().frames.len()
    }

    pub fn frames(&self) -> Vec<RenderRecord> {
        self.log.borrow().frames.clone()
    }

    /// Last `(width, height, dpr)` passed to `set_size`
    pub fn last_size(&self) -> Option<(f32, f32, f32)> {
        self.log.borrow().sizes.last().copied()
    }
}

impl SceneRenderer for RecordingRenderer {
    fn render(&mut self, objects: &ObjectStore, scene: ObjectKey, camera: ObjectKey) -> Result<()> {
        self.log.borrow_mut().frames.push(RenderRecord {
            scene,
            camera,
            object_count: objects.len(),
        });
        Ok(())
    }

    fn set_size(&mut self, width: f32, height: f32, dpr: f32) {
        self.log.borrow_mut().sizes.push((width, height, dpr));
    }
}
