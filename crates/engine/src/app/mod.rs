mod geometry;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod tools;

pub use geometry::{
    overlaps, rect_within, rects_colliding, snap_offset, Bounds, Rect, SnapPoint, Vec2,
    SNAP_POINTS,
};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{Renderer, Viewport};
pub use scene::{Entity, EntityDesc, EntityId, HudSnapshot, InputSnapshot, Renderable, Scene, World};
pub(crate) use tools::OverlayData;
