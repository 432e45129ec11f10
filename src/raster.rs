use crate::command::DrawCommand;
use crate::core::{PixelBuffer, PixelFormat, Rect, Rgba8Premul};
use crate::error::{BrixelError, BrixelResult};
use crate::ops::{self, RenderOp};

/// Transient state handed to the rasterizer for the Rgba→Rgba path: operator,
/// tint, and the clip already resolved against the output bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawContext {
    pub op: RenderOp,
    pub tint: Rgba8Premul,
    pub clip: Rect,
}

impl DrawContext {
    pub fn for_output(cmd: &DrawCommand, output: &PixelBuffer) -> Self {
        let bounds = output.bounds();
        let clip = match cmd.clip {
            Some(c) => c.intersect(bounds),
            None => bounds,
        };
        Self {
            op: cmd.op,
            tint: cmd.tint,
            clip,
        }
    }
}

/// The generic RGBA drawing capability this engine composes with rather than
/// reimplements. Implementations scale when the rectangle extents differ
/// (`smooth` selects filtered sampling) and honor `ctx.clip`.
pub trait Rasterizer: Send + Sync {
    fn draw(
        &self,
        ctx: &DrawContext,
        dst: &mut PixelBuffer,
        src: &PixelBuffer,
        src_rect: Rect,
        dst_rect: Rect,
        smooth: bool,
    ) -> BrixelResult<()>;
}

/// Reference CPU rasterizer: per-pixel sampling (nearest, or bilinear when
/// `smooth` and the extents differ), tint modulation, operator combine.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuRasterizer;

impl Rasterizer for CpuRasterizer {
    fn draw(
        &self,
        ctx: &DrawContext,
        dst: &mut PixelBuffer,
        src: &PixelBuffer,
        src_rect: Rect,
        dst_rect: Rect,
        smooth: bool,
    ) -> BrixelResult<()> {
        if src.format != PixelFormat::Rgba || dst.format != PixelFormat::Rgba {
            return Err(BrixelError::validation(
                "rasterizer draw expects rgba source and destination",
            ));
        }
        if src.data.len() != src.expected_len() || dst.data.len() != dst.expected_len() {
            return Err(BrixelError::validation(
                "pixel storage length does not match buffer dimensions",
            ));
        }
        if src_rect.is_empty() || dst_rect.is_empty() {
            return Ok(());
        }
        if !src.bounds().contains_rect(src_rect) {
            return Err(BrixelError::geometry(format!(
                "source rectangle {src_rect:?} outside {}x{}",
                src.width, src.height
            )));
        }

        let region = dst_rect.intersect(ctx.clip).intersect(dst.bounds());
        if region.is_empty() {
            return Ok(());
        }

        let scaling = src_rect.w != dst_rect.w || src_rect.h != dst_rect.h;
        let step_x = ((src_rect.w as u64) << 16) / dst_rect.w as u64;
        let step_y = ((src_rect.h as u64) << 16) / dst_rect.h as u64;

        for y in region.y..region.bottom() {
            let v = (y - dst_rect.y) as u64;
            for x in region.x..region.right() {
                let u = (x - dst_rect.x) as u64;
                let sample = if !scaling {
                    src.rgba_at((src_rect.x as u64 + u) as u32, (src_rect.y as u64 + v) as u32)
                } else if smooth {
                    sample_bilinear(src, src_rect, u * step_x, v * step_y)
                } else {
                    let sx = src_rect.x as u64 + ((u * step_x) >> 16);
                    let sy = src_rect.y as u64 + ((v * step_y) >> 16);
                    src.rgba_at(sx as u32, sy as u32)
                };
                let s = modulate(sample, ctx.tint);
                let d = dst.rgba_at(x as u32, y as u32);
                dst.put_rgba(x as u32, y as u32, combine(ctx.op, s, d));
            }
        }
        Ok(())
    }
}

/// Channelwise premultiplied modulation; opaque white is the identity.
fn modulate(px: Rgba8Premul, tint: Rgba8Premul) -> Rgba8Premul {
    if tint == Rgba8Premul::opaque_white() {
        return px;
    }
    Rgba8Premul {
        r: ops::mul_div255(u16::from(px.r), u16::from(tint.r)),
        g: ops::mul_div255(u16::from(px.g), u16::from(tint.g)),
        b: ops::mul_div255(u16::from(px.b), u16::from(tint.b)),
        a: ops::mul_div255(u16::from(px.a), u16::from(tint.a)),
    }
}

fn combine(op: RenderOp, s: Rgba8Premul, d: Rgba8Premul) -> Rgba8Premul {
    match op {
        RenderOp::Blend => ops::over(s, d),
        RenderOp::Copy => s,
        RenderOp::Add => Rgba8Premul {
            r: d.r.saturating_add(s.r),
            g: d.g.saturating_add(s.g),
            b: d.b.saturating_add(s.b),
            a: d.a.saturating_add(s.a),
        },
        RenderOp::Sub => Rgba8Premul {
            r: d.r.saturating_sub(s.r),
            g: d.g.saturating_sub(s.g),
            b: d.b.saturating_sub(s.b),
            a: d.a.saturating_sub(s.a),
        },
        RenderOp::Mul => Rgba8Premul {
            r: ops::mul_div255(u16::from(s.r), u16::from(d.r)),
            g: ops::mul_div255(u16::from(s.g), u16::from(d.g)),
            b: ops::mul_div255(u16::from(s.b), u16::from(d.b)),
            a: ops::mul_div255(u16::from(s.a), u16::from(d.a)),
        },
        RenderOp::Mask => Rgba8Premul {
            r: ops::mul_div255(u16::from(d.r), u16::from(s.a)),
            g: ops::mul_div255(u16::from(d.g), u16::from(s.a)),
            b: ops::mul_div255(u16::from(d.b), u16::from(s.a)),
            a: ops::mul_div255(u16::from(d.a), u16::from(s.a)),
        },
    }
}

/// Q16 bilinear sample inside `src_rect`; neighbors clamp at the rect edge.
fn sample_bilinear(src: &PixelBuffer, src_rect: Rect, fx: u64, fy: u64) -> Rgba8Premul {
    let ix = (fx >> 16) as i32;
    let tx = fx & 0xFFFF;
    let iy = (fy >> 16) as i32;
    let ty = fy & 0xFFFF;
    let x0 = (src_rect.x + ix.min(src_rect.w - 1)) as u32;
    let x1 = (src_rect.x + (ix + 1).min(src_rect.w - 1)) as u32;
    let y0 = (src_rect.y + iy.min(src_rect.h - 1)) as u32;
    let y1 = (src_rect.y + (iy + 1).min(src_rect.h - 1)) as u32;

    let lerp = |a: u8, b: u8, t: u64| -> u64 {
        (u64::from(a) * (65536 - t) + u64::from(b) * t) >> 16
    };
    let px = |x: u32, y: u32| src.rgba_at(x, y);
    let (p00, p01, p10, p11) = (px(x0, y0), px(x1, y0), px(x0, y1), px(x1, y1));

    let channel = |c00: u8, c01: u8, c10: u8, c11: u8| -> u8 {
        let top = lerp(c00, c01, tx);
        let bot = lerp(c10, c11, tx);
        ((top * (65536 - ty) + bot * ty) >> 16) as u8
    };
    Rgba8Premul {
        r: channel(p00.r, p01.r, p10.r, p11.r),
        g: channel(p00.g, p01.g, p10.g, p11.g),
        b: channel(p00.b, p01.b, p10.b, p11.b),
        a: channel(p00.a, p01.a, p10.a, p11.a),
    }
}
