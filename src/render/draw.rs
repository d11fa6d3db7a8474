use crate::foundation::core::{Affine, ObjectId};
use crate::scene::graph::Scene;

/// One resolved draw command: a visible leaf with its world transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    /// The object to draw.
    pub object: ObjectId,
    /// World transform, the parent chain already composed.
    pub world: Affine,
    /// Draw-order key the list was sorted by.
    pub priority: f64,
}

/// Priority-sorted sequence of draw commands handed to the renderer each
/// tick. Sorted ascending; equal priorities keep their within-slot
/// depth-first order, so back-to-front blending holds when priorities are
/// assigned with that intent.
pub type DrawList = Vec<DrawItem>;

/// Consumer boundary for the external rasterization backend.
///
/// The scheduler supplies visibility-filtered, transform-resolved items; a
/// renderer performs no hierarchy resolution of its own. Payload handling is
/// renderer business, via [`Payload::as_any`](crate::scene::object::Payload::as_any).
pub trait Renderer {
    /// Draw one frame from the sorted list.
    fn draw(&mut self, scene: &Scene, list: &DrawList) -> anyhow::Result<()>;
}

/// Renderer that only counts what it is handed. For tests and demos.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer {
    /// Frames drawn so far.
    pub frames: u64,
    /// Item count of the most recent frame.
    pub last_items: usize,
}

impl Renderer for NullRenderer {
    fn draw(&mut self, _scene: &Scene, list: &DrawList) -> anyhow::Result<()> {
        self.frames += 1;
        self.last_items = list.len();
        Ok(())
    }
}
