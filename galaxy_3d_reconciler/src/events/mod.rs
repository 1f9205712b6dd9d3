//! Pointer events
//!
//! Event and handler vocabulary, the picking [`Raycaster`], the dispatch
//! pipeline implemented on [`Root`](crate::root::Root), and a translator
//! from winit window events.

mod event;
mod raycaster;
mod dispatch;
mod winit_input;

pub use event::{
    EventHandler, EventName, HandlerKind, HandlerMask, HitKey, Intersection, IntersectionOrder,
    MissedCallback, NativePointerEvent, PointerEvent,
};
pub use raycaster::Raycaster;
pub use winit_input::{PointerInput, DOUBLE_CLICK_INTERVAL};
