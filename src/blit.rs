use crate::core::{PixelBuffer, PixelFormat, Rect, Rgba8Premul};
use crate::error::{BrixelError, BrixelResult};
use crate::ops::{AlphaFunc, MaskColorFunc};

/// Mask onto mask: apply the operator's 1-byte combine per pixel. No tint.
pub fn alpha_to_alpha(
    func: AlphaFunc,
    src: &PixelBuffer,
    src_rect: Rect,
    dst: &mut PixelBuffer,
    dst_rect: Rect,
) -> BrixelResult<()> {
    check_formats(src, PixelFormat::Alpha, dst, PixelFormat::Alpha)?;
    if check_pair(src, src_rect, dst, dst_rect)? {
        return Ok(());
    }

    let w = src_rect.w as usize;
    let sw = src.width as usize;
    let dw = dst.width as usize;
    for row in 0..src_rect.h as usize {
        let si = (src_rect.y as usize + row) * sw + src_rect.x as usize;
        let di = (dst_rect.y as usize + row) * dw + dst_rect.x as usize;
        let s_row = &src.data[si..si + w];
        let d_row = &mut dst.data[di..di + w];
        for (d, s) in d_row.iter_mut().zip(s_row) {
            *d = func(*s, *d);
        }
    }
    Ok(())
}

/// Mask onto RGBA: the mask byte scales the tint, the operator combines the
/// result with the destination pixel.
pub fn alpha_to_rgba(
    func: MaskColorFunc,
    tint: Rgba8Premul,
    src: &PixelBuffer,
    src_rect: Rect,
    dst: &mut PixelBuffer,
    dst_rect: Rect,
) -> BrixelResult<()> {
    check_formats(src, PixelFormat::Alpha, dst, PixelFormat::Rgba)?;
    if check_pair(src, src_rect, dst, dst_rect)? {
        return Ok(());
    }

    let w = src_rect.w as usize;
    let sw = src.width as usize;
    let dw = dst.width as usize;
    for row in 0..src_rect.h as usize {
        let si = (src_rect.y as usize + row) * sw + src_rect.x as usize;
        let di = ((dst_rect.y as usize + row) * dw + dst_rect.x as usize) * 4;
        let s_row = &src.data[si..si + w];
        let d_row = &mut dst.data[di..di + w * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row) {
            let out = func(
                tint,
                *s,
                Rgba8Premul {
                    r: d[0],
                    g: d[1],
                    b: d[2],
                    a: d[3],
                },
            );
            d.copy_from_slice(&[out.r, out.g, out.b, out.a]);
        }
    }
    Ok(())
}

/// RGBA onto mask: collapse color to coverage with an unweighted channel
/// average, `(r + g + b) / 3`. Exact integer division, no perceptual
/// weighting. Operator and tint do not apply.
pub fn rgba_to_alpha(
    src: &PixelBuffer,
    src_rect: Rect,
    dst: &mut PixelBuffer,
    dst_rect: Rect,
) -> BrixelResult<()> {
    check_formats(src, PixelFormat::Rgba, dst, PixelFormat::Alpha)?;
    if check_pair(src, src_rect, dst, dst_rect)? {
        return Ok(());
    }

    let w = src_rect.w as usize;
    let sw = src.width as usize;
    let dw = dst.width as usize;
    for row in 0..src_rect.h as usize {
        let si = ((src_rect.y as usize + row) * sw + src_rect.x as usize) * 4;
        let di = (dst_rect.y as usize + row) * dw + dst_rect.x as usize;
        let s_row = &src.data[si..si + w * 4];
        let d_row = &mut dst.data[di..di + w];
        for (d, s) in d_row.iter_mut().zip(s_row.chunks_exact(4)) {
            let sum = u16::from(s[0]) + u16::from(s[1]) + u16::from(s[2]);
            *d = (sum / 3) as u8;
        }
    }
    Ok(())
}

fn check_formats(
    src: &PixelBuffer,
    src_format: PixelFormat,
    dst: &PixelBuffer,
    dst_format: PixelFormat,
) -> BrixelResult<()> {
    if src.format != src_format || dst.format != dst_format {
        return Err(BrixelError::validation(format!(
            "kernel expects {:?} -> {:?}, got {:?} -> {:?}",
            src_format, dst_format, src.format, dst.format
        )));
    }
    if src.data.len() != src.expected_len() || dst.data.len() != dst.expected_len() {
        return Err(BrixelError::validation(
            "pixel storage length does not match buffer dimensions",
        ));
    }
    Ok(())
}

/// Returns `Ok(true)` for a degenerate (empty) pair, which is a no-op.
/// Mismatched extents mean the tiling engine handed us bad geometry: fail
/// before any writes.
fn check_pair(
    src: &PixelBuffer,
    src_rect: Rect,
    dst: &PixelBuffer,
    dst_rect: Rect,
) -> BrixelResult<bool> {
    if src_rect.w != dst_rect.w || src_rect.h != dst_rect.h {
        tracing::error!(?src_rect, ?dst_rect, "mismatched blit extents");
        return Err(BrixelError::geometry(format!(
            "blit rectangles must match: {src_rect:?} vs {dst_rect:?}"
        )));
    }
    if src_rect.is_empty() {
        return Ok(true);
    }
    if !src.bounds().contains_rect(src_rect) || !dst.bounds().contains_rect(dst_rect) {
        return Err(BrixelError::geometry(format!(
            "blit rectangles out of bounds: src {src_rect:?} in {}x{}, dst {dst_rect:?} in {}x{}",
            src.width, src.height, dst.width, dst.height
        )));
    }
    Ok(false)
}
