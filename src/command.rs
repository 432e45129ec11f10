use crate::core::{FillMode, Rect, Rgba8Premul};
use crate::ops::RenderOp;

/// One blend instruction: how to composite an input buffer onto an output
/// buffer. The buffers themselves are passed alongside the command
/// ([`crate::engine::BlendEngine::blend`]) or resolved by id through
/// [`crate::program::FilterProgram`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DrawCommand {
    #[serde(default)]
    pub fill: FillMode,
    #[serde(default)]
    pub op: RenderOp,
    /// Tint applied to mask sources and to the Rgba→Rgba rasterizer pass.
    /// Opaque white is the identity.
    #[serde(default)]
    pub tint: Rgba8Premul,
    /// Destination placement offset. Under repeat fill this phases the tiling;
    /// negative values wrap (see the tiling engine).
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    /// Clip rectangle for the Rgba→Rgba rasterizer pass; always intersected
    /// with the output bounds. The CPU mask kernels ignore it.
    #[serde(default)]
    pub clip: Option<Rect>,
}

impl Default for DrawCommand {
    fn default() -> Self {
        Self {
            fill: FillMode::none(),
            op: RenderOp::Blend,
            tint: Rgba8Premul::opaque_white(),
            offset_x: 0,
            offset_y: 0,
            clip: None,
        }
    }
}

impl DrawCommand {
    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_fill(mut self, fill: FillMode) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_op(mut self, op: RenderOp) -> Self {
        self.op = op;
        self
    }

    pub fn with_tint(mut self, tint: Rgba8Premul) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }
}
