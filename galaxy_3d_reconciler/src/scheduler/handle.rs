/// The part of the scheduler every root can reach.
///
/// Roots use it to wake the frame loop on invalidation and to queue
/// deferred disposal of removed subtrees. Cloning is cheap; all clones share
/// one running flag and one task queue.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use crate::scene::NativeObject;

/// Platform per-frame callback (e.g. `Window::request_redraw`)
pub trait FrameRequester {
    fn request_frame(&self);
}

/// Removed subtree awaiting release, children before parents
pub struct DisposeTask {
    objects: Vec<NativeObject>,
}

impl DisposeTask {
    /// `objects` must already be ordered children before parents
    pub fn new(objects: Vec<NativeObject>) -> Self {
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Release every object; failures are logged and skipped
    ///
    /// Returns the number of release hooks that failed.
    pub fn run(self) -> usize {
        let mut failures = 0;
        for object in self.objects {
            if let Err(error) = object.dispose() {
                failures += 1;
                crate::engine_warn!(
                    "galaxy3d::Scheduler",
                    "Dispose of {} failed: {}",
                    object.type_name(),
                    error
                );
            }
        }
        failures
    }
}

#[derive(Default)]
struct Shared {
    running: Cell<bool>,
    requester: RefCell<Option<Rc<dyn FrameRequester>>>,
    idle: RefCell<VecDeque<DisposeTask>>,
}

/// Shared scheduler state reachable from roots
#[derive(Clone, Default)]
pub struct SchedulerHandle {
    shared: Rc<Shared>,
}

impl SchedulerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frame_requester(&self, requester: Option<Rc<dyn FrameRequester>>) {
        *self.shared.requester.borrow_mut() = requester;
    }

    /// A frame is scheduled or executing
    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.shared.running.set(running);
    }

    /// Wake the loop if it is idle
    pub fn request_frame(&self) {
        if !self.shared.running.replace(true) {
            self.notify_requester();
        }
    }

    /// Ask the platform for another tick while already running
    pub(crate) fn request_next_frame(&self) {
        self.shared.running.set(true);
        self.notify_requester();
    }

    fn notify_requester(&self) {
        let requester = self.shared.requester.borrow().clone();
        if let Some(requester) = requester {
            requester.request_frame();
        }
    }

    /// Queue a removed subtree for release at idle time
    pub fn schedule_disposal(&self, task: DisposeTask) {
        if !task.is_empty() {
            self.shared.idle.borrow_mut().push_back(task);
        }
    }

    pub fn pending_tasks(&self) -> usize {
        self.shared.idle.borrow().len()
    }

    /// Drain the idle queue in submission order
    ///
    /// Returns the number of objects released.
    pub fn run_idle_tasks(&self) -> usize {
        let mut released = 0;
        loop {
            let next = self.shared.idle.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            released += task.len();
            task.run();
        }
        released
    }
}
