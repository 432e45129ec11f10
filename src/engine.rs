use std::sync::Arc;

use crate::blit;
use crate::command::DrawCommand;
use crate::core::{AxisFill, PixelBuffer, PixelFormat};
use crate::error::{BrixelError, BrixelResult};
use crate::ops;
use crate::raster::{CpuRasterizer, DrawContext, Rasterizer};
use crate::scale::ScaleCache;
use crate::tile;

/// The four buffer-format pairings, each with its own inner loop. Resolved
/// once per command; a closed set, so no open dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendKernel {
    AlphaToAlpha,
    AlphaToRgba,
    RgbaToAlpha,
    RgbaToRgba,
}

impl BlendKernel {
    pub fn select(input: PixelFormat, output: PixelFormat) -> Self {
        match (input, output) {
            (PixelFormat::Alpha, PixelFormat::Alpha) => BlendKernel::AlphaToAlpha,
            (PixelFormat::Alpha, PixelFormat::Rgba) => BlendKernel::AlphaToRgba,
            (PixelFormat::Rgba, PixelFormat::Alpha) => BlendKernel::RgbaToAlpha,
            (PixelFormat::Rgba, PixelFormat::Rgba) => BlendKernel::RgbaToRgba,
        }
    }
}

/// Composites one buffer onto another according to a [`DrawCommand`].
///
/// The engine is synchronous and holds no per-call state; `&self` methods are
/// safe to call from many threads at once as long as each call has exclusive
/// access to its output buffer (the `&mut` makes that the caller's problem,
/// as intended). The only shared mutable state is the scale cache index,
/// which serializes behind its own lock.
pub struct BlendEngine {
    cache: ScaleCache,
    raster: Box<dyn Rasterizer>,
}

impl Default for BlendEngine {
    fn default() -> Self {
        Self::new(Box::new(CpuRasterizer))
    }
}

impl BlendEngine {
    pub fn new(raster: Box<dyn Rasterizer>) -> Self {
        Self {
            cache: ScaleCache::new(),
            raster,
        }
    }

    pub fn cache(&self) -> &ScaleCache {
        &self.cache
    }

    /// Blend `input` onto `output`. Degenerate geometry is a successful
    /// no-op; all real failures happen before the first write.
    #[tracing::instrument(skip_all, fields(
        kernel = ?BlendKernel::select(input.format, output.format),
        src_w = input.width, src_h = input.height,
        dst_w = output.width, dst_h = output.height,
    ))]
    pub fn blend(
        &self,
        cmd: &DrawCommand,
        input: &PixelBuffer,
        output: &mut PixelBuffer,
    ) -> BrixelResult<()> {
        if input.data.len() != input.expected_len() || output.data.len() != output.expected_len() {
            return Err(BrixelError::validation(
                "pixel storage length does not match buffer dimensions",
            ));
        }
        if input.is_degenerate() || output.is_degenerate() {
            return Ok(());
        }

        let (dw, dh) = (output.width as i32, output.height as i32);
        match BlendKernel::select(input.format, output.format) {
            BlendKernel::RgbaToRgba => {
                // The generic rasterizer scales on stretch axes itself; no
                // cache round trip here.
                let ctx = DrawContext::for_output(cmd, output);
                tile::mapped_blend(
                    cmd.fill,
                    input.width as i32,
                    input.height as i32,
                    cmd.offset_x,
                    cmd.offset_y,
                    dw,
                    dh,
                    &mut |sr, dr| self.raster.draw(&ctx, output, input, sr, dr, true),
                )
            }
            BlendKernel::AlphaToAlpha => {
                let func = ops::alpha_func(cmd.op).ok_or_else(|| {
                    BrixelError::operator(format!("{:?} has no alpha combine", cmd.op))
                })?;
                let source = self.stretched_source(cmd, input, output)?;
                let src = source.as_buffer();
                tile::mapped_blend(
                    cmd.fill,
                    src.width as i32,
                    src.height as i32,
                    cmd.offset_x,
                    cmd.offset_y,
                    dw,
                    dh,
                    &mut |sr, dr| blit::alpha_to_alpha(func, src, sr, output, dr),
                )
            }
            BlendKernel::AlphaToRgba => {
                let func = ops::mask_color_func(cmd.op).ok_or_else(|| {
                    BrixelError::operator(format!("{:?} has no mask-color combine", cmd.op))
                })?;
                let source = self.stretched_source(cmd, input, output)?;
                let src = source.as_buffer();
                tile::mapped_blend(
                    cmd.fill,
                    src.width as i32,
                    src.height as i32,
                    cmd.offset_x,
                    cmd.offset_y,
                    dw,
                    dh,
                    &mut |sr, dr| blit::alpha_to_rgba(func, cmd.tint, src, sr, output, dr),
                )
            }
            BlendKernel::RgbaToAlpha => {
                let source = self.stretched_source(cmd, input, output)?;
                let src = source.as_buffer();
                tile::mapped_blend(
                    cmd.fill,
                    src.width as i32,
                    src.height as i32,
                    cmd.offset_x,
                    cmd.offset_y,
                    dw,
                    dh,
                    &mut |sr, dr| blit::rgba_to_alpha(src, sr, output, dr),
                )
            }
        }
    }

    /// Resolve the effective source for the CPU kernels: a stretch axis whose
    /// extent differs from the output pulls a resized copy from the cache, so
    /// the kernels always see equal-extent rectangle pairs.
    fn stretched_source<'a>(
        &self,
        cmd: &DrawCommand,
        input: &'a PixelBuffer,
        output: &PixelBuffer,
    ) -> BrixelResult<SourceRef<'a>> {
        let sw = match cmd.fill.x {
            AxisFill::Stretch => output.width,
            _ => input.width,
        };
        let sh = match cmd.fill.y {
            AxisFill::Stretch => output.height,
            _ => input.height,
        };
        if (sw, sh) == (input.width, input.height) {
            return Ok(SourceRef::Direct(input));
        }
        Ok(SourceRef::Scaled(self.cache.scaled(input, sw, sh)?))
    }
}

enum SourceRef<'a> {
    Direct(&'a PixelBuffer),
    Scaled(Arc<PixelBuffer>),
}

impl SourceRef<'_> {
    fn as_buffer(&self) -> &PixelBuffer {
        match self {
            SourceRef::Direct(buf) => buf,
            SourceRef::Scaled(arc) => arc,
        }
    }
}
