//! Per-surface root store
//!
//! One [`Root`] per rendering surface: scene, camera, raycaster, clock,
//! size/viewport, frame policy, subscribers and interaction state.

mod root;
mod clock;
mod config;
mod renderer;
mod viewport;

pub use root::{Root, FrameCallback, SubscriptionId, FRAME_CAP};
pub(crate) use root::HoverRecord;
pub use clock::Clock;
pub use config::{
    CameraConfig, ComputeOffsets, EventConfig, Frameloop, Projection, RaycasterConfig, RootConfig,
};
pub use renderer::{RecordingRenderer, RenderRecord, SceneRenderer};
pub use viewport::{Size, Viewport};
