//! Render-loop scheduler
//!
//! A single [`Scheduler`] drives every mounted root: invalidation wakes it
//! through the shared [`SchedulerHandle`], each tick renders the roots that
//! still owe frames, and removed subtrees are released from an idle queue
//! once the tick is done.

mod handle;
mod scheduler;

pub use handle::{DisposeTask, FrameRequester, SchedulerHandle};
pub use scheduler::{EffectCallback, EffectId, RootKey, Scheduler};
